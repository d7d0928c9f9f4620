//! Gateway state and configuration.

use super::{mailer::Mailer, rate_limit::RateLimiter};
use std::{path::PathBuf, sync::Arc};

const DEFAULT_SITE_TITLE: &str = "My Blog";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;
const DEFAULT_SESSION_TIMEOUT_DAYS: i64 = 7;
const DEFAULT_SESSION_RETENTION_DAYS: i64 = 30;

/// Paths served without a session: the concrete login flow endpoints and the
/// health check, never a whole prefix. Anything not named here is guarded, so
/// an unrouted path can never fall through to the static site unauthenticated.
/// An entry ending in `/` matches exactly one trailing path segment.
fn default_allow_list() -> Vec<String> {
    [
        "/auth/login",
        "/auth/request-link",
        "/auth/verify/",
        "/auth/logout",
        "/health",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[derive(Clone, Debug)]
pub struct GateConfig {
    base_url: String,
    site_title: String,
    public_dir: PathBuf,
    content_dir: PathBuf,
    token_ttl_minutes: i64,
    session_timeout_days: i64,
    session_retention_days: i64,
    cookie_secure: Option<bool>,
    allow_list: Vec<String>,
}

impl GateConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            site_title: DEFAULT_SITE_TITLE.to_string(),
            public_dir: PathBuf::from("public"),
            content_dir: PathBuf::from("content"),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            session_timeout_days: DEFAULT_SESSION_TIMEOUT_DAYS,
            session_retention_days: DEFAULT_SESSION_RETENTION_DAYS,
            cookie_secure: None,
            allow_list: default_allow_list(),
        }
    }

    #[must_use]
    pub fn with_site_title(mut self, title: String) -> Self {
        self.site_title = title;
        self
    }

    #[must_use]
    pub fn with_public_dir(mut self, dir: PathBuf) -> Self {
        self.public_dir = dir;
        self
    }

    #[must_use]
    pub fn with_content_dir(mut self, dir: PathBuf) -> Self {
        self.content_dir = dir;
        self
    }

    #[must_use]
    pub fn with_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.token_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_session_timeout_days(mut self, days: i64) -> Self {
        self.session_timeout_days = days;
        self
    }

    #[must_use]
    pub fn with_session_retention_days(mut self, days: i64) -> Self {
        self.session_retention_days = days;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = Some(secure);
        self
    }

    #[must_use]
    pub fn with_allow_list(mut self, allow_list: Vec<String>) -> Self {
        self.allow_list = allow_list;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn site_title(&self) -> &str {
        &self.site_title
    }

    #[must_use]
    pub fn public_dir(&self) -> &PathBuf {
        &self.public_dir
    }

    #[must_use]
    pub fn content_dir(&self) -> &PathBuf {
        &self.content_dir
    }

    #[must_use]
    pub fn token_ttl_minutes(&self) -> i64 {
        self.token_ttl_minutes
    }

    #[must_use]
    pub fn session_timeout_seconds(&self) -> i64 {
        self.session_timeout_days * 24 * 60 * 60
    }

    #[must_use]
    pub fn session_retention_days(&self) -> i64 {
        self.session_retention_days
    }

    /// Whether session cookies carry the `Secure` attribute. Unless set
    /// explicitly, derived from the base URL scheme.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
            .unwrap_or_else(|| self.base_url.starts_with("https://"))
    }

    #[must_use]
    pub fn allow_list(&self) -> &[String] {
        &self.allow_list
    }
}

/// Shared per-process state handed to every handler.
pub struct GateState {
    config: GateConfig,
    mailer: Arc<dyn Mailer>,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl GateState {
    #[must_use]
    pub fn new(config: GateConfig, mailer: Arc<dyn Mailer>, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            config,
            mailer,
            rate_limiter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    #[must_use]
    pub fn mailer(&self) -> &Arc<dyn Mailer> {
        &self.mailer
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.rate_limiter
    }
}
