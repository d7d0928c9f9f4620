//! Session cookie building and parsing.

use super::state::GateConfig;
use axum::http::{header::InvalidHeaderValue, HeaderMap, HeaderValue};

pub(crate) const SESSION_COOKIE_NAME: &str = "lychgate_session";

/// Build the `HttpOnly` cookie carrying a freshly minted session id.
pub(crate) fn session_cookie(
    config: &GateConfig,
    session_id: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.session_timeout_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    // Only mark cookies secure when the site is served over HTTPS.
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Cookie that overwrites and immediately expires the session cookie.
pub(crate) fn clear_session_cookie(config: &GateConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the session id out of the request's `Cookie` header, if present.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}
