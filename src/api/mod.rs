//! HTTP surface: router assembly and server startup.

use crate::api::{
    handlers::{auth, health, orphans},
    state::GateState,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
    Extension, Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer,
    services::{ServeDir, ServeFile},
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod error;
pub mod guard;
pub mod handlers;
pub mod mailer;
pub mod rate_limit;
pub mod session;
pub mod state;

/// Build the full application router.
///
/// Every route and the static fallback sit behind the session guard; the
/// guard itself sits behind the tracing and request-id layers so its logs
/// carry a request id.
#[must_use]
pub fn router(pool: SqlitePool, state: Arc<GateState>) -> Router {
    let public_dir = state.config().public_dir().clone();
    // Unknown paths fall back to index.html so client-side routes resolve.
    let site = ServeDir::new(&public_dir).fallback(ServeFile::new(public_dir.join("index.html")));

    Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", get(auth::login))
        .route("/auth/request-link", axum::routing::post(auth::request_link))
        .route("/auth/verify/:token", get(auth::verify))
        .route("/auth/logout", get(auth::logout).post(auth::logout))
        .route("/api/orphans", get(orphans::orphans))
        .fallback_service(site)
        .layer(middleware::from_fn(guard::guard))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state))
                .layer(Extension(pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn serve(port: u16, pool: SqlitePool, state: Arc<GateState>) -> Result<()> {
    let app = router(pool, state);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{mailer::LogMailer, rate_limit::NoopRateLimiter, state::GateConfig};
    use crate::store::{sessions, test_pool, unix_now};
    use axum::{
        body::Body,
        http::{header::COOKIE, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_state() -> Arc<GateState> {
        let config = GateConfig::new("http://localhost:8080".to_string());
        Arc::new(GateState::new(
            config,
            Arc::new(LogMailer),
            Arc::new(NoopRateLimiter),
        ))
    }

    #[tokio::test]
    async fn health_is_reachable_without_a_session() {
        let app = router(test_pool().await, test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_page_is_reachable_without_a_session() {
        let app = router(test_pool().await, test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/login")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_page_redirects_without_a_session() {
        let app = router(test_pool().await, test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/posts/hello")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|loc| loc.to_str().ok()),
            Some("/auth/login")
        );
    }

    #[tokio::test]
    async fn protected_api_returns_json_401_without_a_session() {
        let app = router(test_pool().await, test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orphans")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_session_passes_the_guard() {
        let pool = test_pool().await;
        let session_id = sessions::create(&pool, "user@example.com", unix_now())
            .await
            .expect("create session");
        let app = router(pool, test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orphans")
                    .header(COOKIE, format!("lychgate_session={session_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unrouted_auth_paths_never_reach_the_static_fallback_unauthenticated() {
        let public = std::env::temp_dir().join(format!(
            "lychgate-fallback-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&public).expect("public dir");
        std::fs::write(public.join("index.html"), "private notes").expect("index");

        let config = GateConfig::new("http://localhost:8080".to_string())
            .with_public_dir(public.clone());
        let state = Arc::new(GateState::new(
            config,
            Arc::new(LogMailer),
            Arc::new(NoopRateLimiter),
        ));
        let pool = test_pool().await;
        let app = router(pool.clone(), state);

        // No route handles these, so they would hit the index.html fallback;
        // without a session they must bounce to login instead.
        for path in ["/auth/not-a-route", "/auth/verify/", "/auth/verify/abc/def"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(path)
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "path {path}");
            assert_eq!(
                response
                    .headers()
                    .get(axum::http::header::LOCATION)
                    .and_then(|loc| loc.to_str().ok()),
                Some("/auth/login"),
                "path {path}"
            );
        }

        // With a session the same path is served like any other page.
        let session_id = sessions::create(&pool, "user@example.com", unix_now())
            .await
            .expect("create session");
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/auth/not-a-route")
                    .header(COOKIE, format!("lychgate_session={session_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let _ = std::fs::remove_dir_all(&public);
    }

    #[tokio::test]
    async fn garbage_cookie_is_rejected() {
        let app = router(test_pool().await, test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/posts/hello")
                    .header(COOKIE, "lychgate_session=forged")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
