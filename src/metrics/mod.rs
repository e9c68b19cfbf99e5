//! Metrics collection and push export.
//!
//! This module owns the process-wide counter registry, the request-tracking
//! middleware, the OS samplers and the periodic export of every metric to the
//! remote collector.

mod encode;
mod exporter;
mod middleware;
mod recorder;
mod system;

pub use exporter::{spawn_telemetry_tasks, MetricsExporter, TelemetryHandle};
pub use middleware::track_requests;
pub use recorder::{Metrics, MetricsRecorder, MetricsSnapshot};
pub use system::memory_usage_percentage;
