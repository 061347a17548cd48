use std::sync::{Mutex, PoisonError};

use shared::domain::AccountId;
use tracing::info;

pub const ROOT_PATH: &str = "/";
pub const ACCOUNTS_PATH: &str = "/users";

pub fn account_path(id: &AccountId) -> String {
    format!("{ACCOUNTS_PATH}/{id}")
}

/// Fire-and-forget route change requested by an orchestrator.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "navigate");
    }
}

/// Keeps every requested path in order.
#[derive(Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "navigate");
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}
