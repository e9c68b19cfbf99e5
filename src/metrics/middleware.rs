//! HTTP request tracking middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::recorder::MetricsRecorder;
use crate::state::AppState;

/// Counts every incoming request by method, before route dispatch.
///
/// Tracking is a pure side effect; the request always proceeds.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    state.metrics.record_http_request(request.method());
    next.run(request).await
}
