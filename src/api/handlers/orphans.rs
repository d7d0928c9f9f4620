//! Orphaned page report.

use crate::{api::state::GateState, discovery};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Serialize)]
struct OrphanEntry {
    path: String,
    title: String,
    tags: Vec<String>,
    date: Option<String>,
}

/// GET /api/orphans
///
/// The scan walks the content tree on disk, so it runs on the blocking pool.
pub async fn orphans(state: Extension<Arc<GateState>>) -> impl IntoResponse {
    let content_dir = state.config().content_dir().clone();
    let scan = tokio::task::spawn_blocking(move || {
        let orphans = discovery::find_orphaned_pages(&content_dir);
        let metadata = discovery::page_metadata(&content_dir);
        (orphans, metadata)
    })
    .await;

    let (orphans, mut metadata) = match scan {
        Ok(result) => result,
        Err(err) => {
            error!("Orphan scan failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve orphaned pages" })),
            )
                .into_response();
        }
    };

    let entries: Vec<OrphanEntry> = orphans
        .into_iter()
        .map(|path| match metadata.remove(&path) {
            Some(meta) => OrphanEntry {
                path,
                title: meta.title,
                tags: meta.tags,
                date: meta.date,
            },
            None => OrphanEntry {
                title: path.clone(),
                path,
                tags: Vec::new(),
                date: None,
            },
        })
        .collect();

    let count = entries.len();
    Json(json!({
        "orphans": entries,
        "count": count,
    }))
    .into_response()
}
