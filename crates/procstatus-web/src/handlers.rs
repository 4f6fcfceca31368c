//! Route handlers.

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::Response;
use tracing::debug;

use crate::access_log::CollectSummary;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /status`: collects a fresh snapshot and returns it as pretty JSON.
///
/// Collection reads files synchronously and may wait on per-collector
/// deadlines, so it runs on the blocking pool.
pub(crate) async fn handle_status(State(source): AppState) -> Result<Response, ApiError> {
    let (snapshot, report) = tokio::task::spawn_blocking(move || source.collect_reported())
        .await
        .map_err(|e| ApiError::Internal(format!("collection task failed: {e}")))?;

    let json = snapshot
        .to_pretty_json()
        .map_err(|e| ApiError::Internal(format!("serialization failed: {e}")))?;
    debug!(bytes = json.len(), processes = snapshot.processes.len(), "status snapshot");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, json.len())
        .extension(CollectSummary::from(&report))
        .body(Body::from(json))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Fallback for unknown paths and unsupported methods.
pub(crate) async fn handle_not_found() -> ApiError {
    ApiError::NotFound
}
