//! Session table.
//!
//! Sessions carry two expiry rules: a sliding inactivity timeout checked on
//! every validation, and an absolute ceiling on creation age enforced by the
//! retention sweep. A session that is touched daily still dies when its
//! creation date passes the retention window.

use super::{generate_token, hash_token, is_unique_violation, StoreError};
use sqlx::{Row, SqlitePool};
use tracing::Instrument;

/// Create a session bound to `email` and return the raw session id.
/// Only the hash is stored; the raw id lives in the browser cookie.
///
/// # Errors
/// Returns an error on entropy or database failure.
pub async fn create(pool: &SqlitePool, email: &str, now: i64) -> Result<String, StoreError> {
    let query = r"
        INSERT INTO sessions (session_hash, email, created_at, last_accessed)
        VALUES (?1, ?2, ?3, ?3)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let session_id = generate_token()?;
        let session_hash = hash_token(&session_id);
        let result = sqlx::query(query)
            .bind(&session_hash)
            .bind(email)
            .bind(now)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(session_id),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Err(StoreError::Sql(sqlx::Error::Protocol(
        "failed to generate a unique session id".into(),
    )))
}

/// Check whether a session id names a live session under the sliding
/// inactivity timeout. A session idle past the timeout is deleted here, so an
/// expired id is indistinguishable from one that never existed.
///
/// # Errors
/// Returns an error on database failure.
pub async fn validate(
    pool: &SqlitePool,
    session_id: &str,
    timeout_seconds: i64,
    now: i64,
) -> Result<bool, StoreError> {
    let query = "SELECT last_accessed FROM sessions WHERE session_hash = ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let session_hash = hash_token(session_id);
    let row = sqlx::query(query)
        .bind(&session_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    let Some(row) = row else {
        return Ok(false);
    };

    let last_accessed: i64 = row.get("last_accessed");
    if now - last_accessed > timeout_seconds {
        let delete = "DELETE FROM sessions WHERE session_hash = ?1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "DELETE",
            db.statement = delete
        );
        sqlx::query(delete)
            .bind(&session_hash)
            .execute(pool)
            .instrument(span)
            .await?;
        return Ok(false);
    }

    Ok(true)
}

/// Reset the inactivity clock. Returns false when the session no longer
/// exists, which can happen between a validate and the touch.
///
/// # Errors
/// Returns an error on database failure.
pub async fn touch(pool: &SqlitePool, session_id: &str, now: i64) -> Result<bool, StoreError> {
    let query = "UPDATE sessions SET last_accessed = ?1 WHERE session_hash = ?2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(now)
        .bind(hash_token(session_id))
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// The email a session is bound to, if the session exists.
///
/// # Errors
/// Returns an error on database failure.
pub async fn get_email(pool: &SqlitePool, session_id: &str) -> Result<Option<String>, StoreError> {
    let query = "SELECT email FROM sessions WHERE session_hash = ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(hash_token(session_id))
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.map(|row| row.get("email")))
}

/// Delete a session. Idempotent: deleting an unknown id succeeds and
/// returns false.
///
/// # Errors
/// Returns an error on database failure.
pub async fn delete(pool: &SqlitePool, session_id: &str) -> Result<bool, StoreError> {
    let query = "DELETE FROM sessions WHERE session_hash = ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(hash_token(session_id))
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every session created before `cutoff`, regardless of recent
/// activity. Returns the count removed.
///
/// # Errors
/// Returns an error on database failure.
pub async fn delete_older_than(pool: &SqlitePool, cutoff: i64) -> Result<u64, StoreError> {
    let query = "DELETE FROM sessions WHERE created_at < ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(cutoff)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(result.rows_affected())
}
