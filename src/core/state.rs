use crate::core::error::{Boundary, Operation, ScriptError, ValidationError};
use crate::services::schema::{AdjustmentRequest, GenerationRequest, Script};
use crate::services::script::ScriptService;

/// The script slot owned by a single user session.
///
/// A session holds at most one script and has at most one request in flight.
/// Scripts are only ever replaced wholesale.
#[derive(Debug, Default, Clone)]
pub struct Session {
    script: Option<Script>,
    busy: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self) -> Option<&Script> {
        self.script.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn clear(&mut self) {
        self.script = None;
    }

    /// Marks a request as in flight. Fails if one already is.
    pub fn begin(&mut self, operation: Operation) -> Result<(), ScriptError> {
        if self.busy {
            return Err(ScriptError::Busy { operation });
        }
        self.busy = true;
        Ok(())
    }

    /// Starts a fresh generation: the previous script is dropped.
    pub fn begin_generation(&mut self) -> Result<(), ScriptError> {
        self.begin(Operation::GenerateScript)?;
        self.script = None;
        Ok(())
    }

    pub fn apply_generation(&mut self, result: Result<Script, ScriptError>) -> Result<&Script, ScriptError> {
        self.busy = false;
        match result {
            Ok(script) => Ok(&*self.script.insert(script)),
            Err(e) => {
                self.script = None;
                Err(e)
            }
        }
    }

    /// Replaces the script on success and keeps the previous one on failure.
    pub fn apply_adjustment(&mut self, result: Result<Script, ScriptError>) -> Result<&Script, ScriptError> {
        self.busy = false;
        match result {
            Ok(script) => Ok(&*self.script.insert(script)),
            Err(e) => Err(e),
        }
    }

    pub fn adjustment_request(&self, text: &str) -> Result<AdjustmentRequest, ScriptError> {
        match &self.script {
            Some(script) => Ok(AdjustmentRequest::new(script.clone(), text)),
            None => Err(ScriptError::Validation {
                operation: Operation::AdjustScript,
                boundary: Boundary::Input,
                input: serde_json::json!({ "adjustmentRequest": text }).to_string(),
                source: ValidationError::single("originalScript", "no script to adjust"),
            }),
        }
    }

    pub async fn generate(
        &mut self,
        service: &ScriptService,
        request: &GenerationRequest,
    ) -> Result<&Script, ScriptError> {
        self.begin_generation()?;
        let result = service.generate(request).await;
        self.apply_generation(result)
    }

    pub async fn adjust(&mut self, service: &ScriptService, text: &str) -> Result<&Script, ScriptError> {
        let request = self.adjustment_request(text)?;
        self.begin(Operation::AdjustScript)?;
        let result = service.adjust(&request).await;
        self.apply_adjustment(result)
    }
}
