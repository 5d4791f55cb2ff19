use crate::core::config::GenerationConfig;
use crate::core::error::Operation;
use crate::core::state::Session;
use crate::services::schema::{GenerationRequest, Script, VideoFormat, VideoStyle};
use crate::services::script::ScriptService;
use leptos::*;
use std::rc::Rc;

#[component]
pub fn App(service: Rc<ScriptService>, generation: GenerationConfig) -> impl IntoView {
    let session = create_rw_signal(Session::new());
    let (topic, set_topic) = create_signal(String::new());
    let (format, set_format) = create_signal(generation.default_format);
    let (style, set_style) = create_signal(generation.default_style);
    let (adjustment, set_adjustment) = create_signal(String::new());
    let (message, set_message) = create_signal(None::<String>);

    let busy = move || session.with(|s| s.is_busy());
    let has_script = move || session.with(|s| s.script().is_some());

    let generate_service = service.clone();
    let on_generate = move |_| {
        let mut started = Ok(());
        session.update(|s| started = s.begin_generation());
        if let Err(e) = started {
            log::warn!("{}", e);
            return;
        }
        set_message.set(None);

        let service = generate_service.clone();
        let request = GenerationRequest::new(
            topic.get_untracked(),
            format.get_untracked(),
            style.get_untracked(),
        );
        spawn_local(async move {
            let result = service.generate(&request).await;
            let mut outcome = Ok(());
            session.update(|s| outcome = s.apply_generation(result).map(|_| ()));
            match outcome {
                Ok(()) => set_message.set(Some("Script generated!".to_string())),
                Err(e) => {
                    log::error!("Failed to generate script: {}", e);
                    set_message.set(Some(format!(
                        "There was a problem generating your script: {}",
                        e
                    )));
                }
            }
        });
    };

    let adjust_service = service;
    let on_adjust = move |_| {
        let request = match session.with_untracked(|s| s.adjustment_request(&adjustment.get_untracked())) {
            Ok(request) => request,
            Err(e) => {
                set_message.set(Some(e.to_string()));
                return;
            }
        };
        let mut started = Ok(());
        session.update(|s| started = s.begin(Operation::AdjustScript));
        if let Err(e) = started {
            log::warn!("{}", e);
            return;
        }
        set_message.set(None);

        let service = adjust_service.clone();
        spawn_local(async move {
            let result = service.adjust(&request).await;
            let mut outcome = Ok(());
            session.update(|s| outcome = s.apply_adjustment(result).map(|_| ()));
            match outcome {
                Ok(()) => {
                    set_adjustment.set(String::new());
                    set_message.set(Some("Script adjusted!".to_string()));
                }
                Err(e) => {
                    log::error!("Failed to adjust script: {}", e);
                    set_message.set(Some(format!(
                        "There was a problem adjusting your script, the previous version is kept: {}",
                        e
                    )));
                }
            }
        });
    };

    view! {
        <div class="app-container">
            <h1>"Scriptify"</h1>
            <div class="input-section">
                <input
                    type="text"
                    placeholder="e.g. student budgeting"
                    prop:value=topic
                    on:input=move |ev| set_topic.set(event_target_value(&ev))
                />
                <select on:change=move |ev| {
                    if let Ok(f) = event_target_value(&ev).parse::<VideoFormat>() {
                        set_format.set(f);
                    }
                }>
                    {VideoFormat::ALL
                        .into_iter()
                        .map(|f| view! {
                            <option value=f.as_str() selected=move || format.get() == f>{f.as_str()}</option>
                        })
                        .collect_view()}
                </select>
                <select on:change=move |ev| {
                    if let Ok(s) = event_target_value(&ev).parse::<VideoStyle>() {
                        set_style.set(s);
                    }
                }>
                    {VideoStyle::ALL
                        .into_iter()
                        .map(|s| view! {
                            <option value=s.as_str() selected=move || style.get() == s>{s.as_str()}</option>
                        })
                        .collect_view()}
                </select>
                <button on:click=on_generate prop:disabled=busy>"Generate Script"</button>
            </div>

            {move || message.get().map(|m| view! { <p class="message">{m}</p> })}
            {move || busy().then(|| view! { <p class="loading">"Working on your script..."</p> })}
            {move || session.with(|s| s.script().cloned()).map(|script| view! { <ScriptView script=script/> })}

            <div class="adjust-section" class:hidden=move || !has_script()>
                <h3>"Adjust Your Script"</h3>
                <textarea
                    rows=4
                    placeholder="e.g. 'Make the hook funnier', 'Add a specific hashtag to the CTA'"
                    prop:value=adjustment
                    on:input=move |ev| set_adjustment.set(event_target_value(&ev))
                ></textarea>
                <button on:click=on_adjust prop:disabled=busy>"Submit Adjustments"</button>
            </div>
        </div>
    }
}

#[component]
fn ScriptView(script: Script) -> impl IntoView {
    let plain = script.to_plain_text();
    view! {
        <div class="script">
            <h3>"Hook"</h3>
            <p>{script.hook.clone()}</p>
            {script
                .scenes
                .iter()
                .enumerate()
                .map(|(i, scene)| view! {
                    <SceneCard
                        index={i + 1}
                        text=scene.text.clone()
                        visual=scene.visual_suggestion.clone()
                    />
                })
                .collect_view()}
            <h3>"Call to Action"</h3>
            <p>{script.cta.clone()}</p>
            <details>
                <summary>"Plain text"</summary>
                <textarea readonly=true rows=12>{plain}</textarea>
            </details>
        </div>
    }
}

#[component]
fn SceneCard(index: usize, text: String, visual: String) -> impl IntoView {
    view! {
        <div class="scene-card">
            <h4>"Scene " {index}</h4>
            <p>{text}</p>
            <p class="visual"><em>"Visual: "</em>{visual}</p>
        </div>
    }
}
