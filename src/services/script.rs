use crate::core::config::Config;
use crate::core::error::{Boundary, ErrorHint, Operation, ScriptError, ValidationError};
use crate::services::llm::create_llm;
use crate::services::prompt::{adjustment_prompt, generation_prompt};
use crate::services::schema::{
    AdjustmentRequest, GenerationRequest, SceneLimits, Script, Shape, Validate,
};
use crate::services::structured::{GenerationService, LlmGenerationService, StructuredPrompt};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;

/// Generates and adjusts short-video scripts through a [`GenerationService`].
///
/// Each call validates its request, makes exactly one call to the service and
/// validates what comes back. Nothing is retried or cached here; retry policy
/// belongs to the caller.
pub struct ScriptService {
    generator: Box<dyn GenerationService>,
    limits: SceneLimits,
}

impl ScriptService {
    pub fn new(generator: Box<dyn GenerationService>, limits: SceneLimits) -> Self {
        Self { generator, limits }
    }

    pub fn limits(&self) -> &SceneLimits {
        &self.limits
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<Script, ScriptError> {
        let op = Operation::GenerateScript;
        let input = serialize_input(request);
        request
            .validate(&self.limits)
            .map_err(|e| self.invalid(op, Boundary::Input, &input, e))?;

        info!(
            "Generating {} {} script for topic: {}",
            request.format, request.style, request.topic
        );
        self.run(op, &input, generation_prompt(request)).await
    }

    pub async fn adjust(&self, request: &AdjustmentRequest) -> Result<Script, ScriptError> {
        let op = Operation::AdjustScript;
        let input = serialize_input(request);
        request
            .validate(&self.limits)
            .map_err(|e| self.invalid(op, Boundary::Input, &input, e))?;

        info!("Adjusting script: {}", request.adjustment_request);
        self.run(op, &input, adjustment_prompt(request)).await
    }

    /// Shape-checks an untyped request before generating.
    pub async fn generate_value(&self, request: &Value) -> Result<Script, ScriptError> {
        let request = GenerationRequest::from_value(request, &self.limits).map_err(|e| {
            self.invalid(Operation::GenerateScript, Boundary::Input, &request.to_string(), e)
        })?;
        self.generate(&request).await
    }

    /// Shape-checks an untyped request before adjusting.
    pub async fn adjust_value(&self, request: &Value) -> Result<Script, ScriptError> {
        let request = AdjustmentRequest::from_value(request, &self.limits).map_err(|e| {
            self.invalid(Operation::AdjustScript, Boundary::Input, &request.to_string(), e)
        })?;
        self.adjust(&request).await
    }

    async fn run(
        &self,
        op: Operation,
        input: &str,
        prompt: StructuredPrompt,
    ) -> Result<Script, ScriptError> {
        let output = match self.generator.run_structured_prompt(&prompt).await {
            Ok(output) => output,
            Err(source) => {
                error!("Detailed error in {}: {:#}", op, source);
                error!("Input to {}: {}", op, input);
                let hint = ErrorHint::classify(&format!("{:#}", source));
                return Err(ScriptError::Transport {
                    operation: op,
                    input: input.to_string(),
                    hint,
                    source,
                });
            }
        };

        let Some(value) = output else {
            error!("{} returned no output for {}. Input: {}", prompt.name, op, input);
            return Err(ScriptError::Generation {
                operation: op,
                message: format!("the model returned no usable output for {}", prompt.name),
                hint: None,
                input: input.to_string(),
            });
        };

        Script::from_value(&value, &self.limits)
            .map_err(|e| self.invalid(op, Boundary::Output, input, e))
    }

    fn invalid(
        &self,
        op: Operation,
        boundary: Boundary,
        input: &str,
        source: ValidationError,
    ) -> ScriptError {
        error!("Invalid {} in {}: {}", boundary, op, source);
        error!("Input to {}: {}", op, input);
        ScriptError::Validation {
            operation: op,
            boundary,
            input: input.to_string(),
            source,
        }
    }
}

pub fn create_script_service(config: &Config) -> anyhow::Result<ScriptService> {
    let llm = create_llm(&config.llm)?;
    Ok(ScriptService::new(
        Box::new(LlmGenerationService::new(llm)),
        config.generation.scene_limits(),
    ))
}

fn serialize_input<T: Serialize>(request: &T) -> String {
    serde_json::to_string(request).unwrap_or_else(|e| format!("<unserializable input: {}>", e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::prompt::{ADJUST_PROMPT_NAME, GENERATE_PROMPT_NAME};
    use crate::services::schema::tests::sample_script;
    use crate::services::schema::{VideoFormat, VideoStyle};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    pub(crate) enum Reply {
        Value(Value),
        Absent,
        Fail(&'static str),
    }

    /// Replays canned replies in order and records every prompt it sees.
    pub(crate) struct ScriptedService {
        replies: Mutex<VecDeque<Reply>>,
        pub(crate) call_count: Arc<Mutex<usize>>,
        pub(crate) prompts: Arc<Mutex<Vec<StructuredPrompt>>>,
    }

    impl ScriptedService {
        pub(crate) fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                call_count: Arc::new(Mutex::new(0)),
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedService {
        async fn run_structured_prompt(&self, prompt: &StructuredPrompt) -> Result<Option<Value>> {
            *self.call_count.lock().unwrap() += 1;
            self.prompts.lock().unwrap().push(prompt.clone());
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Value(v)) => Ok(Some(v)),
                Some(Reply::Absent) | None => Ok(None),
                Some(Reply::Fail(msg)) => Err(anyhow!(msg)),
            }
        }
    }

    fn service(replies: Vec<Reply>) -> (ScriptService, Arc<Mutex<usize>>) {
        let scripted = ScriptedService::new(replies);
        let count = scripted.call_count.clone();
        (
            ScriptService::new(Box::new(scripted), SceneLimits::default()),
            count,
        )
    }

    fn budgeting() -> GenerationRequest {
        GenerationRequest::new("student budgeting", VideoFormat::TikTok, VideoStyle::Listicle)
    }

    fn script_value() -> Value {
        serde_json::to_value(sample_script()).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_validated_script() {
        let scripted = ScriptedService::new(vec![Reply::Value(script_value())]);
        let prompts = scripted.prompts.clone();
        let service = ScriptService::new(Box::new(scripted), SceneLimits::default());

        let script = service.generate(&budgeting()).await.unwrap();
        assert!(!script.hook.is_empty());
        assert!(!script.scenes.is_empty());
        assert!(!script.cta.is_empty());
        assert!(script.validate(service.limits()).is_ok());

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].name, GENERATE_PROMPT_NAME);
        assert!(prompts[0].user.contains("Topic: student budgeting"));
    }

    #[tokio::test]
    async fn test_generate_is_not_memoized() {
        let mut second = sample_script();
        second.hook = "A completely different hook".to_string();
        let (service, count) = service(vec![
            Reply::Value(script_value()),
            Reply::Value(serde_json::to_value(&second).unwrap()),
        ]);

        let a = service.generate(&budgeting()).await.unwrap();
        let b = service.generate(&budgeting()).await.unwrap();
        assert_eq!(*count.lock().unwrap(), 2);
        assert!(a.validate(service.limits()).is_ok());
        assert!(b.validate(service.limits()).is_ok());
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_before_dispatch() {
        let (service, count) = service(vec![Reply::Value(script_value())]);
        let request = GenerationRequest::new("   ", VideoFormat::TikTok, VideoStyle::Skit);

        let err = service.generate(&request).await.unwrap_err();
        match &err {
            ScriptError::Validation {
                operation,
                boundary,
                source,
                ..
            } => {
                assert_eq!(*operation, Operation::GenerateScript);
                assert_eq!(*boundary, Boundary::Input);
                assert!(source.has_field("topic"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(!err.is_retryable());
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_format_or_style_never_dispatched() {
        let (service, count) = service(vec![Reply::Value(script_value())]);

        let err = service
            .generate_value(&json!({ "topic": "cats", "format": "Snapchat", "style": "Listicle" }))
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            ScriptError::Validation { source, .. } if source.has_field("format")
        ));

        let err = service
            .generate_value(&json!({ "topic": "cats", "format": "TikTok", "style": "Vlog" }))
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            ScriptError::Validation { source, .. } if source.has_field("style")
        ));

        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_generate_value_accepts_wire_names() {
        let (service, count) = service(vec![Reply::Value(script_value())]);
        let script = service
            .generate_value(&json!({
                "topic": "morning routines",
                "format": "Instagram Reel",
                "style": "How-To"
            }))
            .await
            .unwrap();
        assert_eq!(script, sample_script());
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_absent_output_is_generation_error() {
        let (service, _) = service(vec![Reply::Absent]);
        let err = service.generate(&budgeting()).await.unwrap_err();

        assert!(matches!(err, ScriptError::Generation { .. }));
        assert_eq!(err.operation(), Operation::GenerateScript);
        assert!(err.to_string().starts_with("Error in generate_script:"));
        assert!(err.input().contains("student budgeting"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_hook_output_is_validation_error() {
        let (service, _) = service(vec![Reply::Value(json!({ "hook": "", "scenes": [], "cta": "x" }))]);
        let err = service.generate(&budgeting()).await.unwrap_err();

        match err {
            ScriptError::Validation {
                boundary, source, ..
            } => {
                assert_eq!(boundary, Boundary::Output);
                assert!(source.has_field("hook"));
            }
            other => panic!("expected output validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partial_output_never_surfaces() {
        let (service, _) = service(vec![Reply::Value(json!({
            "hook": "Great hook",
            "scenes": [ { "text": "Only text" } ]
        }))]);
        let err = service.generate(&budgeting()).await.unwrap_err();
        match err {
            ScriptError::Validation { source, .. } => {
                assert!(source.has_field("scenes[0].visualSuggestion"));
                assert!(source.has_field("cta"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_wrapped_with_hint() {
        let (service, _) = service(vec![Reply::Fail(
            "Gemini API error: API key not valid. Please pass a valid API key.",
        )]);
        let err = service.generate(&budgeting()).await.unwrap_err();

        assert!(matches!(err, ScriptError::Transport { .. }));
        assert_eq!(err.hint(), Some(ErrorHint::Credentials));
        let text = err.to_string();
        assert!(text.starts_with("Error in generate_script: Gemini API error"));
        assert!(text.contains("Potential API key or permission issue"));
    }

    #[tokio::test]
    async fn test_transport_error_without_hint() {
        let (service, _) = service(vec![Reply::Fail("connection refused")]);
        let err = service
            .adjust(&AdjustmentRequest::new(sample_script(), "shorter"))
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Operation::AdjustScript);
        assert_eq!(err.hint(), None);
    }

    #[tokio::test]
    async fn test_adjust_returns_full_script() {
        let mut revised = sample_script();
        revised.hook = "Why is saving money funnier than it sounds?".to_string();
        let scripted = ScriptedService::new(vec![Reply::Value(serde_json::to_value(&revised).unwrap())]);
        let prompts = scripted.prompts.clone();
        let service = ScriptService::new(Box::new(scripted), SceneLimits::default());

        let request = AdjustmentRequest::new(sample_script(), "make the hook funnier");
        let script = service.adjust(&request).await.unwrap();
        assert_eq!(script, revised);

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts[0].name, ADJUST_PROMPT_NAME);
        assert!(prompts[0].user.contains("make the hook funnier"));
    }

    #[tokio::test]
    async fn test_adjust_rejects_patch_output() {
        let (service, _) = service(vec![Reply::Value(json!({ "hook": "Only the hook changed" }))]);
        let err = service
            .adjust(&AdjustmentRequest::new(sample_script(), "make the hook funnier"))
            .await
            .unwrap_err();
        match err {
            ScriptError::Validation {
                operation,
                boundary,
                source,
                ..
            } => {
                assert_eq!(operation, Operation::AdjustScript);
                assert_eq!(boundary, Boundary::Output);
                assert!(source.has_field("scenes"));
                assert!(source.has_field("cta"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_adjust_input_validation() {
        let (service, count) = service(vec![]);

        let err = service
            .adjust(&AdjustmentRequest::new(sample_script(), ""))
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            ScriptError::Validation { source, boundary: Boundary::Input, .. }
                if source.has_field("adjustmentRequest")
        ));

        let mut broken = sample_script();
        broken.scenes[1].visual_suggestion.clear();
        let err = service
            .adjust(&AdjustmentRequest::new(broken, "funnier"))
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            ScriptError::Validation { source, .. }
                if source.has_field("originalScript.scenes[1].visualSuggestion")
        ));

        let err = service
            .adjust_value(&json!({ "originalScript": "not a script", "adjustmentRequest": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            ScriptError::Validation { source, .. } if source.has_field("originalScript")
        ));

        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn test_create_script_service_uses_configured_limits() {
        let config = Config::from_yaml_str(
            "llm:\n  provider: ollama\n  ollama:\n    base_url: http://localhost:11434\n    model: llama3\ngeneration:\n  max_scenes: 4\n",
        )
        .unwrap();
        let service = create_script_service(&config).unwrap();
        assert_eq!(service.limits().max_scenes, 4);
    }

    #[tokio::test]
    async fn test_absent_adjustment_names_operation() {
        let (service, _) = service(vec![Reply::Absent]);
        let err = service
            .adjust(&AdjustmentRequest::new(sample_script(), "make the hook funnier"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::Generation { .. }));
        assert!(err.to_string().starts_with("Error in adjust_script:"));
    }
}
