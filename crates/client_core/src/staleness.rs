use chrono::{DateTime, Duration, Utc};

/// How long fetched reference data is trusted before it is refetched.
pub const FRESHNESS_WINDOW_SECS: i64 = 10 * 60;

pub fn freshness_window() -> Duration {
    Duration::seconds(FRESHNESS_WINDOW_SECS)
}

/// True when cached reference data must be refetched.
pub fn is_outdated(last_fetch: Option<DateTime<Utc>>) -> bool {
    is_outdated_at(last_fetch, Utc::now())
}

pub fn is_outdated_at(last_fetch: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_fetch {
        None => true,
        Some(fetched_at) => now - fetched_at > freshness_window(),
    }
}
