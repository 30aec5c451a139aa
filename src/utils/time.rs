use alloy::primitives::U256;
use chrono::{DateTime, Utc};

/// A router deadline `minutes` after `now`, in unix seconds
#[must_use]
pub fn deadline_from(now: DateTime<Utc>, minutes: i64) -> U256 {
    let seconds = now.timestamp().saturating_add(minutes.saturating_mul(60));
    U256::from(u64::try_from(seconds).unwrap_or_default())
}

/// A router deadline `minutes` from the current time, in unix seconds
#[must_use]
pub fn deadline(minutes: i64) -> U256 {
    deadline_from(Utc::now(), minutes)
}
