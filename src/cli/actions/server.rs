use crate::api::{
    self,
    mailer::{self, LogMailer, Mailer, MailgunMailer},
    rate_limit::{FixedWindowRateLimiter, RateLimiter},
    state::{GateConfig, GateState},
};
use crate::store;
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::warn;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub db_path: PathBuf,
    pub base_url: String,
    pub public_dir: PathBuf,
    pub content_dir: PathBuf,
    pub site_title: String,
    pub token_ttl_minutes: i64,
    pub session_timeout_days: i64,
    pub session_retention_days: i64,
    pub rate_limit_per_hour: u32,
    pub cookie_secure: bool,
    pub mailgun_domain: Option<String>,
    pub mailgun_api_key: Option<SecretString>,
    pub from_email: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    Url::parse(&args.base_url)
        .with_context(|| format!("Invalid base URL: {}", args.base_url))?;

    let pool = store::open(&args.db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", args.db_path.display()))?;

    let mut config = GateConfig::new(args.base_url)
        .with_site_title(args.site_title)
        .with_public_dir(args.public_dir)
        .with_content_dir(args.content_dir)
        .with_token_ttl_minutes(args.token_ttl_minutes)
        .with_session_timeout_days(args.session_timeout_days)
        .with_session_retention_days(args.session_retention_days);
    if args.cookie_secure {
        config = config.with_cookie_secure(true);
    }

    let mailer: Arc<dyn Mailer> = match (args.mailgun_domain, args.mailgun_api_key) {
        (Some(domain), Some(api_key)) => {
            let from = mailer::from_header(config.site_title(), &args.from_email);
            Arc::new(
                MailgunMailer::new(domain, api_key, from)
                    .context("Failed to build Mailgun client")?,
            )
        }
        _ => {
            warn!("Mailgun not configured; magic links will be logged, not emailed");
            Arc::new(LogMailer)
        }
    };

    let rate_limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowRateLimiter::new(
        args.rate_limit_per_hour,
        Duration::from_secs(60 * 60),
    ));

    let state = Arc::new(GateState::new(config, mailer, rate_limiter));

    api::serve(args.port, pool, state).await
}
