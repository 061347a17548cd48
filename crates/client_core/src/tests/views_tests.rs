use super::*;
use chrono::{Duration, Utc};
use shared::domain::{AccountProfile, CommentId};
use storage::StoredTokens;

use crate::{container::ContainerEvent, session::SessionEvent, store::StoreEvent};

fn account(id: &str) -> Account {
    Account {
        id: AccountId::from(id),
        email: format!("{id}@example.test"),
        rate: 4,
        completed_meetings: 3,
        image: String::new(),
        profile: AccountProfile::default(),
    }
}

fn comment(id: &str, page_id: &str, minutes_ago: i64) -> Comment {
    Comment {
        id: CommentId::from(id),
        page_id: AccountId::from(page_id),
        author_id: AccountId::from("author"),
        content: format!("comment {id}"),
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

fn quality(id: &str) -> Quality {
    Quality {
        id: QualityId::from(id),
        name: id.to_uppercase(),
        color: "info".into(),
    }
}

fn receive(state: &mut StoreState, event: StoreEvent) {
    state.apply(event, Utc::now());
}

#[test]
fn logged_out_state_has_no_current_user() {
    let state = StoreState::default();
    assert_eq!(session_status(&state), SessionStatus::LoggedOut);
    assert!(!is_logged_in(&state));
    assert!(current_user_id(&state).is_none());
    assert!(current_user(&state).is_none());
    assert!(!accounts_loaded(&state));
}

#[test]
fn restored_session_counts_as_logged_in() {
    let tokens = StoredTokens {
        user_id: AccountId::from("u1"),
        access_token: "access".into(),
        refresh_token: "refresh".into(),
        expires_at: Utc::now(),
    };
    let mut state = StoreState::bootstrap(Some(&tokens));
    assert!(is_logged_in(&state));
    assert!(current_user(&state).is_none());

    receive(
        &mut state,
        StoreEvent::Accounts(ContainerEvent::Received(vec![account("u0"), account("u1")])),
    );
    assert_eq!(current_user(&state), Some(&account("u1")));
    assert!(accounts_loaded(&state));
}

#[test]
fn in_flight_login_is_not_logged_in() {
    let mut state = StoreState::default();
    receive(&mut state, StoreEvent::Session(SessionEvent::AuthRequested));
    assert_eq!(session_status(&state), SessionStatus::Authenticating);
    assert!(!is_logged_in(&state));
}

#[test]
fn appended_account_is_found_by_id() {
    let mut state = StoreState::default();
    receive(
        &mut state,
        StoreEvent::Accounts(ContainerEvent::Appended(account("u5"))),
    );
    assert_eq!(
        account_by_id(&state, &AccountId::from("u5")),
        Some(&account("u5"))
    );
    assert!(account_by_id(&state, &AccountId::from("nope")).is_none());
}

#[test]
fn comments_are_sorted_newest_first() {
    let mut state = StoreState::default();
    receive(
        &mut state,
        StoreEvent::Comments(ContainerEvent::Received(vec![
            comment("old", "p1", 30),
            comment("new", "p1", 1),
            comment("mid", "p2", 10),
        ])),
    );

    let ids: Vec<&str> = comments_sorted(&state)
        .into_iter()
        .map(|comment| comment.id.as_str())
        .collect();
    assert_eq!(ids, ["new", "mid", "old"]);

    let page_ids: Vec<&str> = comments_for_page(&state, &AccountId::from("p1"))
        .into_iter()
        .map(|comment| comment.id.as_str())
        .collect();
    assert_eq!(page_ids, ["new", "old"]);
}

#[test]
fn comments_view_is_empty_before_first_receipt() {
    let state = StoreState::default();
    assert!(comments_sorted(&state).is_empty());
    assert!(!comments_loading(&state));
    assert!(comments_error(&state).is_none());
}

#[test]
fn qualities_by_ids_keeps_order_and_skips_unknown() {
    let mut state = StoreState::default();
    receive(
        &mut state,
        StoreEvent::Qualities(ContainerEvent::Received(vec![
            quality("q1"),
            quality("q2"),
            quality("q3"),
        ])),
    );

    let resolved: Vec<&str> = qualities_by_ids(
        &state,
        &[
            QualityId::from("q3"),
            QualityId::from("missing"),
            QualityId::from("q1"),
        ],
    )
    .into_iter()
    .map(|quality| quality.id.as_str())
    .collect();
    assert_eq!(resolved, ["q3", "q1"]);
    assert_eq!(
        quality_by_id(&state, &QualityId::from("q2")).map(|quality| quality.name.as_str()),
        Some("Q2")
    );
}

#[test]
fn profession_lookup_on_unloaded_catalog_is_none() {
    let state = StoreState::default();
    assert!(professions(&state).is_none());
    assert!(!professions_loading(&state));
    assert!(profession_by_id(&state, &ProfessionId::from("p1")).is_none());
}

#[test]
fn error_views_expose_slots() {
    let mut state = StoreState::default();
    receive(
        &mut state,
        StoreEvent::Accounts(ContainerEvent::Failed(ErrorInfo::message("offline"))),
    );
    receive(
        &mut state,
        StoreEvent::Session(SessionEvent::AuthFailed(ErrorInfo::message("denied"))),
    );
    assert_eq!(accounts_error(&state), Some(&ErrorInfo::message("offline")));
    assert_eq!(session_error(&state), Some(&ErrorInfo::message("denied")));
    assert!(!accounts_loading(&state));
    assert!(accounts(&state).is_none());
    assert!(qualities(&state).is_none());
    assert!(!qualities_loading(&state));
}
