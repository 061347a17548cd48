use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::sync::Mutex;

use shared::domain::AccountId;

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";
const TOKEN_SLOT: i64 = 1;

/// Credentials persisted between runs for the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTokens {
    pub user_id: AccountId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Persistent key-value slot for the session credentials.
#[async_trait]
pub trait SessionTokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredTokens>>;
    async fn set_tokens(&self, tokens: &StoredTokens) -> Result<()>;
    async fn clear(&self) -> Result<()>;

    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.load().await?.map(|tokens| tokens.access_token))
    }

    async fn user_id(&self) -> Result<Option<AccountId>> {
        Ok(self.load().await?.map(|tokens| tokens.user_id))
    }

    async fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load().await?.map(|tokens| tokens.expires_at))
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database sees its own empty database.
        let max_connections = if database_url == MEMORY_DATABASE_URL {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open token store at '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl SessionTokenStore for Storage {
    async fn load(&self) -> Result<Option<StoredTokens>> {
        let row = sqlx::query(
            "SELECT user_id, access_token, refresh_token, expires_at FROM session_tokens WHERE slot = ?",
        )
        .bind(TOKEN_SLOT)
        .fetch_optional(&self.pool)
        .await
        .context("failed to read session tokens")?;

        row.map(|row| -> Result<StoredTokens> {
            Ok(StoredTokens {
                user_id: AccountId(row.try_get::<String, _>("user_id")?),
                access_token: row.try_get("access_token")?,
                refresh_token: row.try_get("refresh_token")?,
                expires_at: row.try_get::<DateTime<Utc>, _>("expires_at")?,
            })
        })
        .transpose()
    }

    async fn set_tokens(&self, tokens: &StoredTokens) -> Result<()> {
        sqlx::query(
            "INSERT INTO session_tokens (slot, user_id, access_token, refresh_token, expires_at, updated_at)
             VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(slot) DO UPDATE SET
                user_id = excluded.user_id,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(TOKEN_SLOT)
        .bind(tokens.user_id.as_str())
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.expires_at)
        .execute(&self.pool)
        .await
        .context("failed to persist session tokens")?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM session_tokens WHERE slot = ?")
            .bind(TOKEN_SLOT)
            .execute(&self.pool)
            .await
            .context("failed to clear session tokens")?;
        Ok(())
    }
}

/// Process-local token slot, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<StoredTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl SessionTokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredTokens>> {
        Ok(self.tokens.lock().await.clone())
    }

    async fn set_tokens(&self, tokens: &StoredTokens) -> Result<()> {
        *self.tokens.lock().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.tokens.lock().await.take();
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == MEMORY_DATABASE_URL || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
