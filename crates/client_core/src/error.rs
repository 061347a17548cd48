use std::fmt;

use shared::error::BackendError;
use thiserror::Error;

/// Only this backend status carries classifiable auth messages.
const CLASSIFIABLE_AUTH_STATUS: u16 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Auth { code: u16, message: String },
    #[error("{0}")]
    Validation(String),
    #[error("session token store failure: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

impl From<BackendError> for ClientError {
    fn from(value: BackendError) -> Self {
        Self::Auth {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(value: anyhow::Error) -> Self {
        Self::Storage(format!("{value:#}"))
    }
}

/// User-facing reasons an authentication attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCategory {
    EmailExists,
    InvalidCredentials,
    WeakPassword,
    TooManyAttempts,
}

impl AuthErrorCategory {
    pub fn message(self) -> &'static str {
        match self {
            Self::EmailExists => "A user with this email already exists",
            Self::InvalidCredentials => "Invalid email or password",
            Self::WeakPassword => "Password should be at least 6 characters",
            Self::TooManyAttempts => "Too many attempts, try again later",
        }
    }
}

impl fmt::Display for AuthErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Contents of a container or session `error` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub category: Option<AuthErrorCategory>,
}

impl ErrorInfo {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: None,
        }
    }

    pub fn classified(category: AuthErrorCategory) -> Self {
        Self {
            message: category.message().to_string(),
            category: Some(category),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&ClientError> for ErrorInfo {
    fn from(value: &ClientError) -> Self {
        Self::message(value.to_string())
    }
}

/// Maps a backend auth rejection onto a known category, if any.
pub fn classify_backend_message(code: u16, message: &str) -> Option<AuthErrorCategory> {
    if code != CLASSIFIABLE_AUTH_STATUS {
        return None;
    }

    // Messages may carry a detail suffix, e.g. "WEAK_PASSWORD : Password should be ...".
    let reason = message.split(':').next().unwrap_or_default().trim();
    match reason {
        "EMAIL_EXISTS" => Some(AuthErrorCategory::EmailExists),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            Some(AuthErrorCategory::InvalidCredentials)
        }
        "WEAK_PASSWORD" => Some(AuthErrorCategory::WeakPassword),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => Some(AuthErrorCategory::TooManyAttempts),
        _ => None,
    }
}

/// Error slot contents for a failed login or registration.
pub fn classify_auth_error(err: &ClientError) -> ErrorInfo {
    match err {
        ClientError::Auth { code, message } => classify_backend_message(*code, message)
            .map(ErrorInfo::classified)
            .unwrap_or_else(|| ErrorInfo::message(message.clone())),
        other => ErrorInfo::from(other),
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
