//! Retention sweep over both tables.

use super::{sessions, tokens, StoreError};
use sqlx::SqlitePool;
use tracing::info;

/// Counts of rows removed by one sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepReport {
    pub expired_tokens: u64,
    pub old_sessions: u64,
}

/// Remove expired magic link tokens and sessions older than the retention
/// window. Safe to run at any cadence; a second run right after the first
/// deletes nothing.
///
/// # Errors
/// Returns an error on database failure.
pub async fn sweep(
    pool: &SqlitePool,
    retention_days: i64,
    now: i64,
) -> Result<SweepReport, StoreError> {
    let expired_tokens = tokens::delete_expired(pool, now).await?;
    let cutoff = now - retention_days * 24 * 60 * 60;
    let old_sessions = sessions::delete_older_than(pool, cutoff).await?;

    info!(expired_tokens, old_sessions, "retention sweep complete");

    Ok(SweepReport {
        expired_tokens,
        old_sessions,
    })
}
