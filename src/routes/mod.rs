//! HTTP route definitions and handlers.
//!
//! The serving surface here is deliberately small: the business endpoints
//! live in the wider pizza service. This crate contributes the health check
//! and the request-tracking middleware every route passes through.

mod health_routes;

use axum::{middleware, Router};

use crate::metrics::track_requests;
use crate::state::AppState;

/// Creates the application router with all configured routes.
///
/// Every route is wrapped by the request-tracking middleware so HTTP traffic
/// is counted before dispatch.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes::routes())
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}
