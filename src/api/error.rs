//! Error taxonomy for the auth flow.
//!
//! Handlers return `Result<_, GateError>` and let the `IntoResponse` impl
//! pick the status and body. Store failures never leak details to the
//! client; they are logged and rendered as a generic failure page.

use super::handlers::pages;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("failed to deliver login email")]
    DeliveryFailed,
    #[error("login link is invalid or expired")]
    InvalidOrExpired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidEmail => (
                StatusCode::BAD_REQUEST,
                pages::error_page("Please enter a valid email address."),
            )
                .into_response(),
            Self::InvalidOrExpired => (
                StatusCode::BAD_REQUEST,
                pages::error_page(
                    "This login link is invalid or has expired. Please request a new one.",
                ),
            )
                .into_response(),
            Self::DeliveryFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                pages::error_page("Failed to send the login email. Please try again later."),
            )
                .into_response(),
            Self::Store(err) => {
                error!("Store failure: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    pages::error_page("Something went wrong. Please try again later."),
                )
                    .into_response()
            }
        }
    }
}

/// Response for a request with no valid session. API paths get a JSON 401;
/// page requests are sent to the login form.
pub(crate) fn unauthorized(path: &str) -> Response {
    if path.starts_with("/api/") {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "authentication required" })),
        )
            .into_response()
    } else {
        Redirect::to("/auth/login").into_response()
    }
}

/// Response for a store failure while authenticating. Fails closed.
pub(crate) fn store_failure(path: &str, err: &StoreError) -> Response {
    error!("Session check failed: {err}");
    if path.starts_with("/api/") {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal error" })),
        )
            .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            pages::error_page("Something went wrong. Please try again later."),
        )
            .into_response()
    }
}
