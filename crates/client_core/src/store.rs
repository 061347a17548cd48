use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use shared::domain::{Account, Comment, Profession, Quality};
use storage::StoredTokens;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    container::{ContainerEvent, EntityContainer},
    session::{Session, SessionEvent},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Accounts(ContainerEvent<Account>),
    Qualities(ContainerEvent<Quality>),
    Professions(ContainerEvent<Profession>),
    Comments(ContainerEvent<Comment>),
    Session(SessionEvent),
}

impl StoreEvent {
    pub fn target(&self) -> &'static str {
        match self {
            Self::Accounts(_) => "accounts",
            Self::Qualities(_) => "qualities",
            Self::Professions(_) => "professions",
            Self::Comments(_) => "comments",
            Self::Session(_) => "session",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Accounts(event) => event.name(),
            Self::Qualities(event) => event.name(),
            Self::Professions(event) => event.name(),
            Self::Comments(event) => event.name(),
            Self::Session(event) => event.name(),
        }
    }
}

/// Everything the data layer knows about the remote service at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub accounts: EntityContainer<Account>,
    pub qualities: EntityContainer<Quality>,
    pub professions: EntityContainer<Profession>,
    pub comments: EntityContainer<Comment>,
    pub session: Session,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::bootstrap(None)
    }
}

impl StoreState {
    pub fn bootstrap(tokens: Option<&StoredTokens>) -> Self {
        Self {
            accounts: EntityContainer::new(),
            qualities: EntityContainer::cacheable(),
            professions: EntityContainer::cacheable(),
            comments: EntityContainer::new(),
            session: Session::bootstrap(tokens),
        }
    }

    pub fn apply(&mut self, event: StoreEvent, now: DateTime<Utc>) {
        match event {
            StoreEvent::Accounts(event) => {
                let confirms_session = matches!(event, ContainerEvent::Received(_));
                let replace_target = match &event {
                    ContainerEvent::ReplacedById(account) => Some(account.id.clone()),
                    _ => None,
                };
                if !self.accounts.apply(event, now) {
                    warn!(
                        account_id = ?replace_target,
                        "account update ignored: id is not in the loaded account list"
                    );
                }
                if confirms_session && self.session.confirm_provisional() {
                    info!(
                        user_id = ?self.session.current_user_id(),
                        "restored session confirmed by account list"
                    );
                }
            }
            StoreEvent::Qualities(event) => {
                self.qualities.apply(event, now);
            }
            StoreEvent::Professions(event) => {
                self.professions.apply(event, now);
            }
            StoreEvent::Comments(event) => {
                self.comments.apply(event, now);
            }
            StoreEvent::Session(event) => {
                let logged_out = matches!(event, SessionEvent::LoggedOut);
                self.session.apply(event);
                if logged_out {
                    self.accounts.reset();
                }
            }
        }
    }
}

/// Process-wide state handle shared by every orchestrator and read view.
///
/// State only changes through [`Store::dispatch`]; each applied event is then published to
/// subscribers in dispatch order.
pub struct Store {
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl Store {
    pub fn new(initial: StoreState) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            state: RwLock::new(initial),
            events,
        })
    }

    pub fn dispatch(&self, event: StoreEvent) {
        debug!(target_container = event.target(), event = event.name(), "dispatch");
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.apply(event.clone(), Utc::now());
        // Publishing under the write lock keeps subscriber order equal to apply order.
        let _ = self.events.send(event);
    }

    pub fn select<R>(&self, view: impl FnOnce(&StoreState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        view(&state)
    }

    pub fn snapshot(&self) -> StoreState {
        self.select(StoreState::clone)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
