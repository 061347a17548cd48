use serde::{Deserialize, Serialize};

use crate::domain::AccountId;

pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Every remote service response wraps its payload in `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub content: T,
}

impl<T> Envelope<T> {
    pub fn new(content: T) -> Self {
        Self { content }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

impl<'a> From<&'a Credentials> for AuthRequest<'a> {
    fn from(value: &'a Credentials) -> Self {
        Self {
            email: &value.email,
            password: &value.password,
            return_secure_token: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub local_id: AccountId,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<String>,
}

impl AuthResponse {
    /// Token lifetime in seconds; the backend sends it as a decimal string.
    pub fn expires_in_secs(&self) -> i64 {
        self.expires_in
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
    }
}

/// Caller-supplied part of a new comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub page_id: AccountId,
    pub content: String,
}
