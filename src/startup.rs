//! Application startup and server initialization.
//!
//! This module handles the creation of the metrics registry, the spawning of
//! the telemetry timers and the HTTP server setup.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::metrics::{spawn_telemetry_tasks, Metrics};
use crate::routes;
use crate::state::AppState;

/// Initializes and runs the application server.
///
/// Constructs the metrics registry, starts the export, decay and CPU sampler
/// timers, and serves the configured routes. The timers are stopped
/// explicitly once serving ends.
///
/// # Errors
///
/// Returns an error if the server encounters a runtime error during
/// execution.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Metrics::new();
    let telemetry = spawn_telemetry_tasks(metrics.clone(), config.metrics.clone());

    info!("Starting server on {}", config.bind_address);

    let state = AppState {
        config: config.clone(),
        metrics,
    };

    let app = routes::create_router(state);

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .expect("Could not bind to specified address");

    let served = axum::serve(listener, app).await;

    telemetry.stop();
    served?;

    Ok(())
}
