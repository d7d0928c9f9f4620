use crate::store::{self, sweeper, unix_now};
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug)]
pub struct Args {
    pub db_path: PathBuf,
    pub retention_days: i64,
}

/// Execute the retention sweep. Intended to be run out-of-band, e.g. daily
/// via cron. Re-invocation is idempotent.
/// # Errors
/// Returns an error if the database cannot be opened or a delete fails.
pub async fn execute(args: Args) -> Result<()> {
    let pool = store::open(&args.db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", args.db_path.display()))?;

    let report = sweeper::sweep(&pool, args.retention_days, unix_now())
        .await
        .context("Retention sweep failed")?;

    println!(
        "Deleted {} expired magic link tokens",
        report.expired_tokens
    );
    println!("Deleted {} old sessions", report.old_sessions);

    Ok(())
}
