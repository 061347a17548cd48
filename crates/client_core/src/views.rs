//! Pure projections of [`StoreState`] consumed by the presentation layer.

use std::cmp::Reverse;

use shared::domain::{Account, AccountId, Comment, Profession, ProfessionId, Quality, QualityId};

use crate::{error::ErrorInfo, session::SessionStatus, store::StoreState};

pub fn session_status(state: &StoreState) -> SessionStatus {
    state.session.status()
}

/// True for a confirmed session and for one restored from persisted tokens.
pub fn is_logged_in(state: &StoreState) -> bool {
    match state.session.status() {
        SessionStatus::LoggedIn => true,
        SessionStatus::Authenticating => state.session.is_provisional(),
        SessionStatus::LoggedOut => false,
    }
}

pub fn current_user_id(state: &StoreState) -> Option<&AccountId> {
    state.session.current_user_id()
}

pub fn current_user(state: &StoreState) -> Option<&Account> {
    let user_id = state.session.current_user_id()?;
    state.accounts.find_by_id(user_id.as_str())
}

pub fn session_error(state: &StoreState) -> Option<&ErrorInfo> {
    state.session.error()
}

pub fn accounts(state: &StoreState) -> Option<&[Account]> {
    state.accounts.entities()
}

pub fn accounts_loading(state: &StoreState) -> bool {
    state.accounts.is_loading()
}

pub fn accounts_error(state: &StoreState) -> Option<&ErrorInfo> {
    state.accounts.error()
}

/// Whether the account list has been received at least once.
pub fn accounts_loaded(state: &StoreState) -> bool {
    state.accounts.has_received()
}

pub fn account_by_id<'a>(state: &'a StoreState, id: &AccountId) -> Option<&'a Account> {
    state.accounts.find_by_id(id.as_str())
}

pub fn qualities(state: &StoreState) -> Option<&[Quality]> {
    state.qualities.entities()
}

pub fn qualities_loading(state: &StoreState) -> bool {
    state.qualities.is_loading()
}

pub fn quality_by_id<'a>(state: &'a StoreState, id: &QualityId) -> Option<&'a Quality> {
    state.qualities.find_by_id(id.as_str())
}

/// Resolves ids in the given order, skipping ids the catalog does not know.
pub fn qualities_by_ids<'a>(state: &'a StoreState, ids: &[QualityId]) -> Vec<&'a Quality> {
    ids.iter()
        .filter_map(|id| state.qualities.find_by_id(id.as_str()))
        .collect()
}

pub fn professions(state: &StoreState) -> Option<&[Profession]> {
    state.professions.entities()
}

pub fn professions_loading(state: &StoreState) -> bool {
    state.professions.is_loading()
}

pub fn profession_by_id<'a>(state: &'a StoreState, id: &ProfessionId) -> Option<&'a Profession> {
    state.professions.find_by_id(id.as_str())
}

pub fn comments_loading(state: &StoreState) -> bool {
    state.comments.is_loading()
}

pub fn comments_error(state: &StoreState) -> Option<&ErrorInfo> {
    state.comments.error()
}

/// Loaded comments, newest first.
pub fn comments_sorted(state: &StoreState) -> Vec<&Comment> {
    let mut comments: Vec<&Comment> = state.comments.entities().unwrap_or_default().iter().collect();
    comments.sort_by_key(|comment| Reverse(comment.created_at));
    comments
}

/// Loaded comments about one page, newest first.
pub fn comments_for_page<'a>(state: &'a StoreState, page_id: &AccountId) -> Vec<&'a Comment> {
    comments_sorted(state)
        .into_iter()
        .filter(|comment| &comment.page_id == page_id)
        .collect()
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;
