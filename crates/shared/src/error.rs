use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputShape,
    Encoding,
    Upstream,
    Interaction,
}

/// Serializable report of a rejected operation, published on a widget's
/// diagnostic channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("value should be a sequence, found {found}")]
    NotASequence { found: &'static str },
    #[error("element {index} is invalid: {defect}")]
    InvalidElement { index: usize, defect: ElementDefect },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementDefect {
    #[error("expected a single-key object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("entry `{key}` is not a boolean")]
    NonBooleanEntry { key: String },
    #[error("object has no name/boolean entry")]
    NoEntries,
}

#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("value attribute is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl AttributeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidJson(_) => ErrorKind::Encoding,
            Self::Invalid(_) => ErrorKind::InputShape,
        }
    }
}

impl From<&ValidationError> for Diagnostic {
    fn from(value: &ValidationError) -> Self {
        Self::new(ErrorKind::InputShape, value.to_string())
    }
}

impl From<&AttributeError> for Diagnostic {
    fn from(value: &AttributeError) -> Self {
        Self::new(value.kind(), value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("no rendered row {row} (group has {rows} rows)")]
    NoSuchRow { row: usize, rows: usize },
}

impl From<&InteractionError> for Diagnostic {
    fn from(value: &InteractionError) -> Self {
        Self::new(ErrorKind::Interaction, value.to_string())
    }
}
