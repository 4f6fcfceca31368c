//! Access logging middleware.
//!
//! One `info` line per request. Responses from `/status` carry a
//! [`CollectSummary`] extension, so the line also says which collectors fell
//! back and how long collection took.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use procstatus_core::collector::CollectReport;

/// Outcome of the collection behind a `/status` response.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CollectSummary {
    pub(crate) failed: Vec<&'static str>,
    pub(crate) collect_time: Duration,
}

impl From<&CollectReport> for CollectSummary {
    fn from(report: &CollectReport) -> Self {
        Self {
            failed: report.failed_collectors(),
            collect_time: report.timing.total,
        }
    }
}

pub(crate) async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    // No peer address under `oneshot`.
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "-".to_owned());
    let started = Instant::now();

    let response = next.run(req).await;

    let latency_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let bytes = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    match response.extensions().get::<CollectSummary>() {
        Some(summary) => info!(
            client,
            status,
            latency_ms,
            bytes,
            collect_ms = summary.collect_time.as_millis() as u64,
            failed = ?summary.failed,
            "{method} {path}"
        ),
        None => info!(client, status, latency_ms, bytes, "{method} {path}"),
    }

    response
}
