use super::*;
use chrono::Utc;

use crate::error::{AuthErrorCategory, ErrorInfo};

fn tokens(user_id: &str) -> StoredTokens {
    StoredTokens {
        user_id: AccountId::from(user_id),
        access_token: "access".into(),
        refresh_token: "refresh".into(),
        expires_at: Utc::now(),
    }
}

#[test]
fn bootstrap_without_tokens_is_logged_out() {
    let session = Session::bootstrap(None);
    assert_eq!(session.status(), SessionStatus::LoggedOut);
    assert!(session.current_user_id().is_none());
    assert!(!session.is_provisional());
}

#[test]
fn bootstrap_with_tokens_is_provisionally_authenticating() {
    let session = Session::bootstrap(Some(&tokens("u1")));
    assert_eq!(session.status(), SessionStatus::Authenticating);
    assert_eq!(session.current_user_id(), Some(&AccountId::from("u1")));
    assert!(session.is_provisional());
}

#[test]
fn bootstrap_ignores_empty_access_token() {
    let mut stored = tokens("u1");
    stored.access_token.clear();
    assert_eq!(
        Session::bootstrap(Some(&stored)).status(),
        SessionStatus::LoggedOut
    );
}

#[test]
fn successful_login_path() {
    let mut session = Session::default();
    session.apply(SessionEvent::AuthRequested);
    assert_eq!(session.status(), SessionStatus::Authenticating);

    session.apply(SessionEvent::AuthSucceeded {
        user_id: AccountId::from("u7"),
    });
    assert_eq!(session.status(), SessionStatus::LoggedIn);
    assert_eq!(session.current_user_id(), Some(&AccountId::from("u7")));
}

#[test]
fn failed_login_returns_to_logged_out_with_error() {
    let mut session = Session::default();
    session.apply(SessionEvent::AuthRequested);
    session.apply(SessionEvent::AuthFailed(ErrorInfo::classified(
        AuthErrorCategory::InvalidCredentials,
    )));

    assert_eq!(session.status(), SessionStatus::LoggedOut);
    assert!(session.current_user_id().is_none());
    assert_eq!(
        session.error().and_then(|error| error.category),
        Some(AuthErrorCategory::InvalidCredentials)
    );
}

#[test]
fn success_clears_previous_error() {
    let mut session = Session::default();
    session.apply(SessionEvent::AuthFailed(ErrorInfo::message("nope")));
    session.apply(SessionEvent::AuthRequested);
    session.apply(SessionEvent::AuthSucceeded {
        user_id: AccountId::from("u1"),
    });
    assert!(session.error().is_none());
}

#[test]
fn logout_resets_everything() {
    let mut session = Session::bootstrap(Some(&tokens("u1")));
    session.apply(SessionEvent::LoggedOut);
    assert_eq!(session, Session::default());
}

#[test]
fn only_restored_sessions_are_confirmed() {
    let mut restored = Session::bootstrap(Some(&tokens("u1")));
    assert!(restored.confirm_provisional());
    assert_eq!(restored.status(), SessionStatus::LoggedIn);
    assert!(!restored.confirm_provisional());

    let mut in_flight = Session::default();
    in_flight.apply(SessionEvent::AuthRequested);
    assert!(!in_flight.confirm_provisional());
    assert_eq!(in_flight.status(), SessionStatus::Authenticating);
}

#[test]
fn new_login_attempt_drops_provisional_flag() {
    let mut session = Session::bootstrap(Some(&tokens("u1")));
    session.apply(SessionEvent::AuthRequested);
    assert!(!session.is_provisional());
    assert!(!session.confirm_provisional());
}

#[test]
fn failed_attempt_keeps_restored_session() {
    let mut session = Session::bootstrap(Some(&tokens("u1")));
    session.apply(SessionEvent::AuthRequested);
    session.apply(SessionEvent::AuthFailed(ErrorInfo::classified(
        AuthErrorCategory::InvalidCredentials,
    )));

    assert_eq!(session.status(), SessionStatus::Authenticating);
    assert!(session.is_provisional());
    assert_eq!(session.current_user_id(), Some(&AccountId::from("u1")));
    assert!(session.error().is_some());
    assert!(session.confirm_provisional());
}

#[test]
fn failed_attempt_keeps_logged_in_user() {
    let mut session = Session::default();
    session.apply(SessionEvent::AuthRequested);
    session.apply(SessionEvent::AuthSucceeded {
        user_id: AccountId::from("u1"),
    });

    session.apply(SessionEvent::AuthRequested);
    session.apply(SessionEvent::AuthRequested);
    session.apply(SessionEvent::AuthFailed(ErrorInfo::message("nope")));

    assert_eq!(session.status(), SessionStatus::LoggedIn);
    assert_eq!(session.current_user_id(), Some(&AccountId::from("u1")));
    assert_eq!(session.error(), Some(&ErrorInfo::message("nope")));

    // Logout forgets the remembered identity.
    session.apply(SessionEvent::LoggedOut);
    session.apply(SessionEvent::AuthRequested);
    session.apply(SessionEvent::AuthFailed(ErrorInfo::message("again")));
    assert_eq!(session.status(), SessionStatus::LoggedOut);
    assert!(session.current_user_id().is_none());
}
