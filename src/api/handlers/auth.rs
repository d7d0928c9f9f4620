//! Magic link login flow: request a link, verify it, log out.

use super::{extract_client_ip, normalize_email, pages, valid_email};
use crate::{
    api::{
        error::GateError,
        mailer,
        rate_limit::RateLimitDecision,
        session::{clear_session_cookie, extract_session_token, session_cookie},
        state::GateState,
    },
    store::{sessions, tokens, unix_now},
};
use axum::{
    extract::{Extension, Path},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct RequestLinkForm {
    email: String,
}

/// GET /auth/login
pub async fn login(state: Extension<Arc<GateState>>) -> Response {
    pages::login_page(state.config().site_title()).into_response()
}

/// POST /auth/request-link
pub async fn request_link(
    pool: Extension<SqlitePool>,
    state: Extension<Arc<GateState>>,
    headers: HeaderMap,
    Form(form): Form<RequestLinkForm>,
) -> Response {
    let client_ip = extract_client_ip(&headers);
    if state.rate_limiter().check_ip(client_ip.as_deref()) == RateLimitDecision::Limited {
        info!(ip = client_ip.as_deref().unwrap_or("unknown"), "magic link request rate limited");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            pages::error_page("Too many login requests. Please try again later."),
        )
            .into_response();
    }

    match issue_magic_link(&pool, &state, &form.email).await {
        Ok(email) => pages::check_email_page(&email).into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /auth/verify/:token
pub async fn verify(
    Path(token): Path<String>,
    pool: Extension<SqlitePool>,
    state: Extension<Arc<GateState>>,
) -> Response {
    let (email, session_id) = match verify_magic_link(&pool, &state, &token).await {
        Ok(result) => result,
        Err(err) => return err.into_response(),
    };

    info!(%email, "logged in via magic link");

    let Ok(cookie) = session_cookie(state.config(), &session_id) else {
        error!("Failed to build session cookie");
        return GateError::Store(sqlx::Error::Protocol("invalid session cookie".into()).into())
            .into_response();
    };
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (headers, Redirect::to("/")).into_response()
}

/// GET|POST /auth/logout
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    state: Extension<Arc<GateState>>,
) -> Response {
    if let Some(session_id) = extract_session_token(&headers) {
        match sessions::delete(&pool, &session_id).await {
            Ok(deleted) => {
                if deleted {
                    info!("logged out");
                }
            }
            Err(err) => error!("Failed to delete session: {err}"),
        }
    }

    // Always clear the cookie, even if there was no session to delete.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (response_headers, Redirect::to("/auth/login")).into_response()
}

/// Issue a magic link for `email`: validate, mint a single-use token, and
/// email the verification link. Returns the normalized address.
///
/// A delivery failure leaves the token in place; it is invisible to the user
/// and ages out with its TTL.
///
/// # Errors
/// Returns an error for a malformed address, a store failure, or a failed
/// email delivery.
pub(crate) async fn issue_magic_link(
    pool: &SqlitePool,
    state: &GateState,
    email: &str,
) -> Result<String, GateError> {
    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(GateError::InvalidEmail);
    }

    let config = state.config();
    let token = tokens::create(pool, &email, config.token_ttl_minutes(), unix_now()).await?;
    let verify_url = build_verify_url(config.base_url(), &token);

    let (subject, text, html) = mailer::login_email(config.site_title(), &verify_url);
    if let Err(err) = state.mailer().send(&email, &subject, &text, &html).await {
        error!(%email, "Failed to send magic link: {err}");
        return Err(GateError::DeliveryFailed);
    }

    info!(%email, "magic link sent");
    Ok(email)
}

/// Consume a magic link token and mint a session for its email. The consume
/// is atomic, so a token presented twice yields exactly one session.
///
/// # Errors
/// Returns an error for an unknown, used, or expired token, or on a store
/// failure.
pub(crate) async fn verify_magic_link(
    pool: &SqlitePool,
    state: &GateState,
    token: &str,
) -> Result<(String, String), GateError> {
    let now = unix_now();
    let Some(email) = tokens::try_consume(pool, token, now).await? else {
        return Err(GateError::InvalidOrExpired);
    };

    let session_id = sessions::create(pool, &email, now).await?;
    Ok((email, session_id))
}

fn build_verify_url(base_url: &str, token: &str) -> String {
    format!("{base_url}/auth/verify/{token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        mailer::Mailer,
        rate_limit::NoopRateLimiter,
        state::GateConfig,
    };
    use crate::store::test_pool;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordingMailer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<(String, String, String)> {
            self.sent.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, text: &str, _html: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .expect("lock")
                .push((to.to_string(), subject.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _text: &str, _html: &str) -> anyhow::Result<()> {
            Err(anyhow!("mailgun unreachable"))
        }
    }

    fn state_with(mailer: Arc<dyn Mailer>) -> GateState {
        let config = GateConfig::new("http://localhost:8080".to_string());
        GateState::new(config, mailer, Arc::new(NoopRateLimiter))
    }

    fn token_from_text(text: &str) -> String {
        let url = text
            .lines()
            .find(|line| line.contains("/auth/verify/"))
            .expect("verify url in email");
        url.rsplit('/').next().expect("token").trim().to_string()
    }

    async fn count_tokens(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM magic_links")
            .fetch_one(pool)
            .await
            .expect("count")
    }

    #[tokio::test]
    async fn issue_normalizes_and_emails_a_working_link() {
        let pool = test_pool().await;
        let mailer = RecordingMailer::new();
        let state = state_with(mailer.clone());

        let email = issue_magic_link(&pool, &state, " User@Example.COM ")
            .await
            .expect("issue");
        assert_eq!(email, "user@example.com");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "user@example.com");
        assert_eq!(sent[0].1, "Your login link for My Blog");

        let token = token_from_text(&sent[0].2);
        let record = tokens::lookup(&pool, &token).await.expect("lookup").expect("record");
        assert_eq!(record.email, "user@example.com");
        assert!(!record.used);
    }

    #[tokio::test]
    async fn issue_rejects_invalid_email_without_a_store_write() {
        let pool = test_pool().await;
        let mailer = RecordingMailer::new();
        let state = state_with(mailer.clone());

        let err = issue_magic_link(&pool, &state, "not-an-email")
            .await
            .expect_err("invalid email");
        assert!(matches!(err, GateError::InvalidEmail));
        assert!(mailer.sent().is_empty());
        assert_eq!(count_tokens(&pool).await, 0);
    }

    #[tokio::test]
    async fn issue_reports_delivery_failure_but_keeps_the_token() {
        let pool = test_pool().await;
        let state = state_with(Arc::new(FailingMailer));

        let err = issue_magic_link(&pool, &state, "user@example.com")
            .await
            .expect_err("delivery failure");
        assert!(matches!(err, GateError::DeliveryFailed));
        assert_eq!(count_tokens(&pool).await, 1);
    }

    #[tokio::test]
    async fn verify_binds_session_to_the_token_email() {
        let pool = test_pool().await;
        let mailer = RecordingMailer::new();
        let state = state_with(mailer.clone());

        issue_magic_link(&pool, &state, "user@example.com")
            .await
            .expect("issue");
        let token = token_from_text(&mailer.sent()[0].2);

        let (email, session_id) = verify_magic_link(&pool, &state, &token)
            .await
            .expect("verify");
        assert_eq!(email, "user@example.com");

        let bound = sessions::get_email(&pool, &session_id).await.expect("get_email");
        assert_eq!(bound.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn verify_rejects_a_second_use() {
        let pool = test_pool().await;
        let mailer = RecordingMailer::new();
        let state = state_with(mailer.clone());

        issue_magic_link(&pool, &state, "user@example.com")
            .await
            .expect("issue");
        let token = token_from_text(&mailer.sent()[0].2);

        verify_magic_link(&pool, &state, &token).await.expect("first verify");
        let err = verify_magic_link(&pool, &state, &token)
            .await
            .expect_err("second verify");
        assert!(matches!(err, GateError::InvalidOrExpired));
    }

    #[tokio::test]
    async fn verify_rejects_unknown_token() {
        let pool = test_pool().await;
        let state = state_with(RecordingMailer::new());

        let err = verify_magic_link(&pool, &state, "bogus")
            .await
            .expect_err("unknown token");
        assert!(matches!(err, GateError::InvalidOrExpired));
    }

    #[test]
    fn verify_url_shape() {
        assert_eq!(
            build_verify_url("https://blog.example.com", "abc"),
            "https://blog.example.com/auth/verify/abc"
        );
    }
}
