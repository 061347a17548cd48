use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the authentication backend.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct BackendError {
    pub code: u16,
    pub message: String,
}

impl BackendError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Body shape of a non-2xx authentication response: `{ "error": { "code", "message" } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendErrorBody {
    pub error: BackendError,
}

impl From<BackendErrorBody> for BackendError {
    fn from(value: BackendErrorBody) -> Self {
        value.error
    }
}
