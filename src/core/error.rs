use std::fmt;
use thiserror::Error;

/// A single offending field, addressed by its path in the request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field(s): {}", join_fields(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    /// Turns a list of collected field errors into a result.
    pub fn check(fields: Vec<FieldError>) -> Result<(), ValidationError> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Self { fields })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GenerateScript,
    AdjustScript,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GenerateScript => f.write_str("generate_script"),
            Operation::AdjustScript => f.write_str("adjust_script"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Input,
    Output,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Input => f.write_str("input"),
            Boundary::Output => f.write_str("model output"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorHint {
    Credentials,
}

impl ErrorHint {
    const CREDENTIAL_PATTERNS: [&'static str; 4] = [
        "api key",
        "permission denied",
        "authentication",
        "unauthorized",
    ];

    pub fn classify(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        Self::CREDENTIAL_PATTERNS
            .iter()
            .any(|p| lower.contains(p))
            .then_some(ErrorHint::Credentials)
    }

    fn advice(self) -> &'static str {
        match self {
            ErrorHint::Credentials => {
                "Potential API key or permission issue. Check the api_key of the configured LLM provider in config.yml"
            }
        }
    }
}

fn hint_suffix(hint: &Option<ErrorHint>) -> String {
    match hint {
        Some(h) => format!(" ({})", h.advice()),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Error in {operation}: invalid {boundary}: {source}")]
    Validation {
        operation: Operation,
        boundary: Boundary,
        input: String,
        #[source]
        source: ValidationError,
    },

    #[error("Error in {operation}: {message}{}", hint_suffix(.hint))]
    Generation {
        operation: Operation,
        message: String,
        hint: Option<ErrorHint>,
        input: String,
    },

    #[error("Error in {operation}: {source:#}{}", hint_suffix(.hint))]
    Transport {
        operation: Operation,
        input: String,
        hint: Option<ErrorHint>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Error in {operation}: another request is already in progress")]
    Busy { operation: Operation },
}

impl ScriptError {
    pub fn operation(&self) -> Operation {
        match self {
            ScriptError::Validation { operation, .. }
            | ScriptError::Generation { operation, .. }
            | ScriptError::Transport { operation, .. }
            | ScriptError::Busy { operation } => *operation,
        }
    }

    /// Serialized request that triggered the failure. Empty for `Busy`,
    /// which is raised before a request is read.
    pub fn input(&self) -> &str {
        match self {
            ScriptError::Validation { input, .. }
            | ScriptError::Generation { input, .. }
            | ScriptError::Transport { input, .. } => input,
            ScriptError::Busy { .. } => "",
        }
    }

    pub fn hint(&self) -> Option<ErrorHint> {
        match self {
            ScriptError::Validation { .. } | ScriptError::Busy { .. } => None,
            ScriptError::Generation { hint, .. } | ScriptError::Transport { hint, .. } => *hint,
        }
    }

    /// Whether re-issuing the same request could succeed. Input validation
    /// failures never can, and a busy session is the caller's own doing.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ScriptError::Validation {
                boundary: Boundary::Input,
                ..
            } | ScriptError::Busy { .. }
        )
    }
}
