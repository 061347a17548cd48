use super::*;
use chrono::{Duration, TimeZone};

fn sample_tokens(user_id: &str) -> StoredTokens {
    StoredTokens {
        user_id: AccountId::from(user_id),
        access_token: format!("access-{user_id}"),
        refresh_token: format!("refresh-{user_id}"),
        expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn empty_store_has_no_session() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.load().await.expect("load").is_none());
    assert!(storage.access_token().await.expect("token").is_none());
    assert!(storage.user_id().await.expect("user").is_none());
}

#[tokio::test]
async fn set_tokens_overwrites_the_single_slot() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .set_tokens(&sample_tokens("u1"))
        .await
        .expect("first write");
    storage
        .set_tokens(&sample_tokens("u2"))
        .await
        .expect("second write");

    let loaded = storage.load().await.expect("load").expect("tokens present");
    assert_eq!(loaded, sample_tokens("u2"));
    assert_eq!(
        storage.user_id().await.expect("user"),
        Some(AccountId::from("u2"))
    );

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM session_tokens")
        .fetch_one(&storage.pool)
        .await
        .expect("count");
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn clear_removes_persisted_session() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .set_tokens(&sample_tokens("u1"))
        .await
        .expect("write");
    storage.clear().await.expect("clear");
    assert!(storage.load().await.expect("load").is_none());

    // Clearing an empty slot is harmless.
    storage.clear().await.expect("clear again");
}

#[tokio::test]
async fn tokens_survive_reopening_a_file_database() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("session.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage
        .set_tokens(&sample_tokens("u7"))
        .await
        .expect("write");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.access_token().await.expect("token"),
        Some("access-u7".to_string())
    );
}

#[tokio::test]
async fn memory_store_round_trips_and_clears() {
    let store = MemoryTokenStore::new();
    assert!(store.load().await.expect("load").is_none());

    let mut tokens = sample_tokens("u3");
    tokens.expires_at = tokens.expires_at + Duration::hours(1);
    store.set_tokens(&tokens).await.expect("write");
    assert_eq!(
        store.expires_at().await.expect("expiry"),
        Some(tokens.expires_at)
    );

    store.clear().await.expect("clear");
    assert!(store.user_id().await.expect("user").is_none());
}

#[test]
fn sqlite_path_ignores_memory_and_non_sqlite_urls() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert!(sqlite_path("postgres://localhost/db").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/session.db?mode=rwc"),
        Some(PathBuf::from("./data/session.db"))
    );
}
