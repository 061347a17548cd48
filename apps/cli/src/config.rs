use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "meetup.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub service_url: String,
    pub auth_url: String,
    pub auth_api_key: String,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8080/".into(),
            auth_url: "https://identitytoolkit.googleapis.com/v1/".into(),
            auth_api_key: String::new(),
            database_url: "sqlite://./data/session.db".into(),
        }
    }
}

impl Settings {
    pub fn service_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.service_url)
            .with_context(|| format!("invalid service url '{}'", self.service_url))
    }

    pub fn auth_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.auth_url).with_context(|| format!("invalid auth url '{}'", self.auth_url))
    }
}

/// Defaults, then the optional config file, then the process environment.
pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(config_path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("service_url") {
        settings.service_url = v.clone();
    }
    if let Some(v) = file_cfg.get("auth_url") {
        settings.auth_url = v.clone();
    }
    if let Some(v) = file_cfg.get("auth_api_key") {
        settings.auth_api_key = v.clone();
    }
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
}

// The APP__ prefixed variable wins over the bare one.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let fields: [(&str, &mut String); 4] = [
        ("SERVICE_URL", &mut settings.service_url),
        ("AUTH_URL", &mut settings.auth_url),
        ("AUTH_API_KEY", &mut settings.auth_api_key),
        ("DATABASE_URL", &mut settings.database_url),
    ];
    for (key, slot) in fields {
        if let Some(v) = lookup(key) {
            *slot = v;
        }
        if let Some(v) = lookup(&format!("APP__{key}")) {
            *slot = v;
        }
    }
}

/// Normalises the token store location; the store creates missing parent directories.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    normalize_database_url(raw_database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
