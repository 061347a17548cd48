use shared::domain::AccountId;
use storage::StoredTokens;

use crate::error::ErrorInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    LoggedOut,
    Authenticating,
    LoggedIn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AuthRequested,
    AuthSucceeded { user_id: AccountId },
    AuthFailed(ErrorInfo),
    LoggedOut,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthRequested => "auth_requested",
            Self::AuthSucceeded { .. } => "auth_succeeded",
            Self::AuthFailed(_) => "auth_failed",
            Self::LoggedOut => "logged_out",
        }
    }
}

/// Authentication status and the identity of the signed-in account.
///
/// A session restored from persisted tokens starts `Authenticating` with a provisional user id
/// and becomes `LoggedIn` once the account list has been received.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    status: SessionStatus,
    current_user_id: Option<AccountId>,
    error: Option<ErrorInfo>,
    provisional: bool,
    before_attempt: Option<Identity>,
}

/// Status and identity held before an auth attempt, restored if the attempt fails.
#[derive(Debug, Clone, PartialEq)]
struct Identity {
    status: SessionStatus,
    current_user_id: Option<AccountId>,
    provisional: bool,
}

impl Session {
    pub fn bootstrap(tokens: Option<&StoredTokens>) -> Self {
        match tokens {
            Some(tokens) if !tokens.access_token.is_empty() => Self {
                status: SessionStatus::Authenticating,
                current_user_id: Some(tokens.user_id.clone()),
                error: None,
                provisional: true,
                before_attempt: None,
            },
            _ => Self::default(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current_user_id(&self) -> Option<&AccountId> {
        self.current_user_id.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn is_provisional(&self) -> bool {
        self.provisional
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::AuthRequested => {
                // Overlapping attempts keep the identity from before the first one.
                if self.before_attempt.is_none() {
                    self.before_attempt = Some(Identity {
                        status: self.status,
                        current_user_id: self.current_user_id.clone(),
                        provisional: self.provisional,
                    });
                }
                self.status = SessionStatus::Authenticating;
                self.provisional = false;
            }
            SessionEvent::AuthSucceeded { user_id } => {
                self.status = SessionStatus::LoggedIn;
                self.current_user_id = Some(user_id);
                self.error = None;
                self.provisional = false;
                self.before_attempt = None;
            }
            SessionEvent::AuthFailed(error) => {
                // A rejected attempt leaves the previous session (and its persisted token) in force.
                let prior = self.before_attempt.take().unwrap_or(Identity {
                    status: SessionStatus::LoggedOut,
                    current_user_id: None,
                    provisional: false,
                });
                self.status = prior.status;
                self.current_user_id = prior.current_user_id;
                self.provisional = prior.provisional;
                self.error = Some(error);
            }
            SessionEvent::LoggedOut => *self = Self::default(),
        }
    }

    /// Promotes a restored session once the account list confirms it.
    pub fn confirm_provisional(&mut self) -> bool {
        if !self.provisional || self.status != SessionStatus::Authenticating {
            return false;
        }
        self.status = SessionStatus::LoggedIn;
        self.provisional = false;
        true
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
