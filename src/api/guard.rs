//! Session guard applied to every route outside the allow list.
//!
//! Runs before the protected handlers and the static file service. Any store
//! failure during the check fails closed.

use super::{
    error::{store_failure, unauthorized},
    session::extract_session_token,
    state::GateState,
};
use crate::store::{sessions, unix_now};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

pub async fn guard(
    Extension(pool): Extension<SqlitePool>,
    Extension(state): Extension<Arc<GateState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_allow_listed(&path, state.config().allow_list()) {
        return next.run(request).await;
    }

    let Some(session_id) = extract_session_token(request.headers()) else {
        info!(%path, "unauthenticated request");
        return unauthorized(&path);
    };

    let now = unix_now();
    let timeout = state.config().session_timeout_seconds();
    match sessions::validate(&pool, &session_id, timeout, now).await {
        Ok(true) => {}
        Ok(false) => {
            info!(%path, "expired or unknown session");
            return unauthorized(&path);
        }
        Err(err) => return store_failure(&path, &err),
    }

    // Valid session: slide the inactivity window before serving. The row can
    // vanish between validate and touch; treat that as unauthenticated.
    match sessions::touch(&pool, &session_id, now).await {
        Ok(true) => next.run(request).await,
        Ok(false) => unauthorized(&path),
        Err(err) => store_failure(&path, &err),
    }
}

/// An entry ending in `/` matches exactly one non-empty trailing segment
/// (`/auth/verify/` covers `/auth/verify/<token>` and nothing deeper);
/// everything else matches exactly. Kept this narrow so the allow list can
/// never cover a path that no route handles, which would otherwise reach the
/// static fallback without a session check.
fn is_allow_listed(path: &str, allow_list: &[String]) -> bool {
    allow_list.iter().any(|entry| {
        if let Some(prefix) = entry.strip_suffix('/') {
            path.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|segment| !segment.is_empty() && !segment.contains('/'))
        } else {
            path == entry
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow() -> Vec<String> {
        crate::api::state::GateConfig::new("http://localhost:8080".to_string())
            .allow_list()
            .to_vec()
    }

    #[test]
    fn login_flow_endpoints_are_open() {
        assert!(is_allow_listed("/auth/login", &allow()));
        assert!(is_allow_listed("/auth/request-link", &allow()));
        assert!(is_allow_listed("/auth/verify/abc", &allow()));
        assert!(is_allow_listed("/auth/logout", &allow()));
    }

    #[test]
    fn health_is_exact() {
        assert!(is_allow_listed("/health", &allow()));
        assert!(!is_allow_listed("/healthz", &allow()));
        assert!(!is_allow_listed("/health/deep", &allow()));
    }

    #[test]
    fn unrouted_auth_paths_are_guarded() {
        assert!(!is_allow_listed("/auth", &allow()));
        assert!(!is_allow_listed("/auth/", &allow()));
        assert!(!is_allow_listed("/auth/not-a-route", &allow()));
        assert!(!is_allow_listed("/auth/verify", &allow()));
        assert!(!is_allow_listed("/auth/verify/", &allow()));
        assert!(!is_allow_listed("/auth/verify/abc/def", &allow()));
        assert!(!is_allow_listed("/auth/loginx", &allow()));
    }

    #[test]
    fn everything_else_is_guarded() {
        assert!(!is_allow_listed("/", &allow()));
        assert!(!is_allow_listed("/posts/hello", &allow()));
        assert!(!is_allow_listed("/api/orphans", &allow()));
        assert!(!is_allow_listed("/index.html", &allow()));
    }
}
