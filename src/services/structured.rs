use crate::services::llm::LlmClient;
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

/// A rendered prompt paired with the JSON Schema its answer must follow.
#[derive(Debug, Clone)]
pub struct StructuredPrompt {
    pub name: &'static str,
    pub system: String,
    pub user: String,
    pub output_schema: Value,
}

#[cfg(target_arch = "wasm32")]
pub trait GenerationBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> GenerationBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait GenerationBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> GenerationBounds for T {}

/// The model endpoint as seen by the script operations.
///
/// `Ok(None)` means the model answered but produced nothing usable as a JSON
/// object. `Err` is reserved for failures of the service itself (network,
/// provider errors, credentials).
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait GenerationService: GenerationBounds {
    async fn run_structured_prompt(&self, prompt: &StructuredPrompt) -> Result<Option<Value>>;
}

pub struct LlmGenerationService {
    llm: Box<dyn LlmClient>,
}

impl LlmGenerationService {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl GenerationService for LlmGenerationService {
    async fn run_structured_prompt(&self, prompt: &StructuredPrompt) -> Result<Option<Value>> {
        let user = format!(
            "{}\n\nRespond only with a JSON object that conforms to this JSON Schema:\n{}",
            prompt.user,
            serde_json::to_string_pretty(&prompt.output_schema)?
        );

        let reply = self.llm.chat_json(&prompt.system, &user).await?;
        debug!("{} raw reply: {}", prompt.name, reply);
        Ok(parse_object(prompt.name, &reply))
    }
}

fn parse_object(name: &str, reply: &str) -> Option<Value> {
    let clean_json = strip_code_blocks(reply);
    if clean_json.is_empty() {
        warn!("{} returned an empty reply", name);
        return None;
    }

    match serde_json::from_str::<Value>(&clean_json) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(other) => {
            warn!("{} returned JSON that is not an object: {}", name, other);
            None
        }
        Err(e) => {
            warn!("{} returned unparseable JSON ({}): {}", name, e, clean_json);
            None
        }
    }
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else {
        s.to_string()
    }
}
