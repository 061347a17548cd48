use chrono::{DateTime, Utc};
use shared::domain::Identified;

use crate::error::ErrorInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Remove,
}

/// Lifecycle events accepted by an [`EntityContainer`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerEvent<T> {
    Requested,
    Received(Vec<T>),
    Failed(ErrorInfo),
    /// Marks the start of a create/update/remove call; changes no state.
    MutationRequested(Mutation),
    Appended(T),
    RemovedById(String),
    ReplacedById(T),
}

impl<T> ContainerEvent<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Received(_) => "received",
            Self::Failed(_) => "failed",
            Self::MutationRequested(_) => "mutation_requested",
            Self::Appended(_) => "appended",
            Self::RemovedById(_) => "removed_by_id",
            Self::ReplacedById(_) => "replaced_by_id",
        }
    }
}

/// A remote-backed collection plus its load and error status.
///
/// `entities` stays `None` until the first successful receipt. A failure keeps whatever
/// was loaded before so the view can keep showing stale data next to the error.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityContainer<T> {
    entities: Option<Vec<T>>,
    is_loading: bool,
    error: Option<ErrorInfo>,
    last_fetch: Option<DateTime<Utc>>,
    cacheable: bool,
}

impl<T> Default for EntityContainer<T> {
    fn default() -> Self {
        Self {
            entities: None,
            is_loading: false,
            error: None,
            last_fetch: None,
            cacheable: false,
        }
    }
}

impl<T: Identified> EntityContainer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A container that stamps `last_fetch` on every receipt.
    pub fn cacheable() -> Self {
        Self {
            cacheable: true,
            ..Self::default()
        }
    }

    pub fn entities(&self) -> Option<&[T]> {
        self.entities.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    pub fn has_received(&self) -> bool {
        self.entities.is_some()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        self.entities
            .as_deref()
            .and_then(|entities| entities.iter().find(|entity| entity.id() == id))
    }

    pub fn requested(&mut self) {
        self.is_loading = true;
    }

    pub fn received(&mut self, payload: Vec<T>, at: DateTime<Utc>) {
        self.entities = Some(payload);
        self.is_loading = false;
        self.error = None;
        if self.cacheable {
            self.last_fetch = Some(at);
        }
    }

    pub fn failed(&mut self, error: ErrorInfo) {
        self.error = Some(error);
        self.is_loading = false;
    }

    pub fn appended(&mut self, item: T) {
        self.entities.get_or_insert_with(Vec::new).push(item);
    }

    pub fn removed_by_id(&mut self, id: &str) {
        if let Some(entities) = self.entities.as_mut() {
            entities.retain(|entity| entity.id() != id);
        }
    }

    /// Overwrites the entity with the same id in place. Returns `false` and leaves the
    /// collection untouched when no such entity is loaded.
    pub fn replaced_by_id(&mut self, item: T) -> bool {
        let Some(slot) = self
            .entities
            .as_mut()
            .and_then(|entities| entities.iter_mut().find(|entity| entity.id() == item.id()))
        else {
            return false;
        };
        *slot = item;
        true
    }

    /// Drops every cached entity and status, back to the initial state.
    pub fn reset(&mut self) {
        self.entities = None;
        self.is_loading = false;
        self.error = None;
        self.last_fetch = None;
    }

    /// Applies one lifecycle event. Returns `false` only for a replace that found no target.
    pub fn apply(&mut self, event: ContainerEvent<T>, now: DateTime<Utc>) -> bool {
        match event {
            ContainerEvent::Requested => self.requested(),
            ContainerEvent::Received(payload) => self.received(payload, now),
            ContainerEvent::Failed(error) => self.failed(error),
            ContainerEvent::MutationRequested(_) => {}
            ContainerEvent::Appended(item) => self.appended(item),
            ContainerEvent::RemovedById(id) => self.removed_by_id(&id),
            ContainerEvent::ReplacedById(item) => return self.replaced_by_id(item),
        }
        true
    }
}

#[cfg(test)]
#[path = "tests/container_tests.rs"]
mod tests;
