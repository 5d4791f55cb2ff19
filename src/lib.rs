pub mod core;
pub mod services;
#[cfg(target_arch = "wasm32")]
pub mod ui;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use leptos::*;

/// Mounts the web front-end. The host page passes the contents of a
/// `config.yml` so the browser build shares the native configuration format.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start(config_yaml: String) -> Result<(), JsValue> {
    use crate::core::config::Config;
    use crate::services::script::create_script_service;
    use std::rc::Rc;

    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).unwrap_or(());

    let config = Config::from_yaml_str(&config_yaml).map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
    let service = Rc::new(create_script_service(&config).map_err(|e| JsValue::from_str(&format!("{:#}", e)))?);
    let generation = config.generation.clone();

    leptos::mount_to_body(move || {
        use crate::ui::App;
        view! { <App service=service.clone() generation=generation.clone()/> }
    });
    Ok(())
}
