//! Health check endpoints.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};

use crate::state::AppState;

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Reports that the service is up. Load balancers poll this endpoint, so the
/// tracking middleware counts these requests like any other GET.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
