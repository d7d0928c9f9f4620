//! Magic link token table.
//!
//! A token is permanently invalid once used or past its expiry. Consumption
//! is a single conditional UPDATE so two concurrent verifications of the same
//! token can never both succeed.

use super::{generate_token, hash_token, is_unique_violation, StoreError};
use sqlx::{Row, SqlitePool};
use tracing::Instrument;

/// Stored token fields, raw token excluded.
#[derive(Debug)]
pub struct TokenRecord {
    pub email: String,
    pub expires_at: i64,
    pub used: bool,
}

/// Persist a fresh token for `email` and return the raw value.
/// Only the hash is stored; the raw token exists solely in the emailed link.
///
/// # Errors
/// Returns an error on entropy or database failure.
pub async fn create(
    pool: &SqlitePool,
    email: &str,
    ttl_minutes: i64,
    now: i64,
) -> Result<String, StoreError> {
    let query = r"
        INSERT INTO magic_links (token_hash, email, created_at, expires_at, used)
        VALUES (?1, ?2, ?3, ?4, 0)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_token()?;
        let token_hash = hash_token(&token);
        let result = sqlx::query(query)
            .bind(&token_hash)
            .bind(email)
            .bind(now)
            .bind(now + ttl_minutes * 60)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Err(StoreError::Sql(sqlx::Error::Protocol(
        "failed to generate a unique magic link token".into(),
    )))
}

/// Look up a token's stored state. Diagnostic read; verification goes through
/// [`try_consume`] so the used check and flip stay atomic.
///
/// # Errors
/// Returns an error on database failure.
pub async fn lookup(pool: &SqlitePool, token: &str) -> Result<Option<TokenRecord>, StoreError> {
    let query = "SELECT email, expires_at, used FROM magic_links WHERE token_hash = ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(hash_token(token))
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.map(|row| TokenRecord {
        email: row.get("email"),
        expires_at: row.get("expires_at"),
        used: row.get("used"),
    }))
}

/// Atomically consume a token: flips `used` only when the token is still
/// unused and unexpired, returning the bound email on success. Under
/// concurrent calls at most one caller observes `Some`.
///
/// # Errors
/// Returns an error on database failure.
pub async fn try_consume(
    pool: &SqlitePool,
    token: &str,
    now: i64,
) -> Result<Option<String>, StoreError> {
    let query = r"
        UPDATE magic_links
        SET used = 1
        WHERE token_hash = ?1
          AND used = 0
          AND expires_at > ?2
        RETURNING email
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(hash_token(token))
        .bind(now)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.map(|row| row.get("email")))
}

/// Delete every token past its expiry, returning the count removed.
/// Used-but-unexpired rows are left alone; they are already invalid and will
/// age out on a later sweep.
///
/// # Errors
/// Returns an error on database failure.
pub async fn delete_expired(pool: &SqlitePool, now: i64) -> Result<u64, StoreError> {
    let query = "DELETE FROM magic_links WHERE expires_at < ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(now)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(result.rows_affected())
}
