//! Periodic push export of the collected metrics.
//!
//! The exporter snapshots the registry on a fixed timer, encodes one payload
//! per metric and POSTs each to the configured collector. A failed push is
//! logged and the cycle moves on to the next record; nothing here ever
//! surfaces an error to the serving path.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error};

use super::encode::{metric_payload, MetricKind, MetricPayload, MetricValue};
use super::recorder::{Metrics, MetricsSnapshot};
use super::system;
use crate::config::MetricsConfig;

/// Pushes one payload per metric to the configured collector.
pub struct MetricsExporter {
    metrics: Metrics,
    config: MetricsConfig,
    client: reqwest::Client,
}

impl MetricsExporter {
    pub fn new(metrics: Metrics, config: MetricsConfig) -> Self {
        MetricsExporter {
            metrics,
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Runs one export cycle: snapshot, encode, push each record in turn.
    pub async fn export_once(&self) {
        let snapshot = self.metrics.snapshot();
        let memory_pct = system::memory_usage_percentage();
        for payload in self.build_payloads(&snapshot, memory_pct) {
            self.push(&payload).await;
        }
    }

    /// One record per metric, in the order they are pushed.
    fn build_payloads(&self, snapshot: &MetricsSnapshot, memory_pct: f64) -> Vec<MetricPayload> {
        use MetricKind::{Gauge, Sum};
        use MetricValue::{Double, Int};

        let source = self.config.source.as_str();
        vec![
            metric_payload("GET", "1", Sum, Int(snapshot.http_get), source),
            metric_payload("POST", "1", Sum, Int(snapshot.http_post), source),
            metric_payload("PUT", "1", Sum, Int(snapshot.http_put), source),
            metric_payload("DELETE", "1", Sum, Int(snapshot.http_delete), source),
            metric_payload("TOTAL", "1", Sum, Int(snapshot.http_total()), source),
            metric_payload("CPU", "%", Gauge, Double(snapshot.cpu_pct), source),
            metric_payload("MEMORY", "%", Gauge, Double(memory_pct), source),
            metric_payload("GEN_LATENCY", "ms", Sum, Double(snapshot.latency_ms), source),
            metric_payload(
                "PIZZA_LATENCY",
                "ms",
                Sum,
                Double(snapshot.pizza_latency_ms),
                source,
            ),
            metric_payload("ACTIVE_USERS", "1", Sum, Int(snapshot.active_users), source),
            metric_payload("SOLD", "1", Sum, Int(snapshot.sold), source),
            metric_payload("FAILED_PIZZAS", "1", Sum, Int(snapshot.failed_pizzas), source),
            metric_payload("REVENUE", "1", Sum, Double(snapshot.revenue), source),
            metric_payload("SUCCESSFUL", "1", Sum, Int(snapshot.auth_successful), source),
            metric_payload("FAILED", "1", Sum, Int(snapshot.auth_failed), source),
        ]
    }

    /// Sends a single payload; any failure is logged and swallowed.
    async fn push(&self, payload: &MetricPayload) {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to encode metrics payload: {}", e);
                return;
            }
        };

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
            .body(body.clone())
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                debug!("Pushed metrics payload to {}", self.config.url);
            }
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                error!(
                    "Failed to push metrics data to collector ({}): {}\n{}",
                    status, text, body
                );
            }
            Err(e) => {
                error!("Error pushing metrics: {}", e);
            }
        }
    }
}

/// Handle over the spawned telemetry tasks.
///
/// The tasks run for the process lifetime; `stop` aborts them explicitly on
/// shutdown.
pub struct TelemetryHandle {
    export_task: JoinHandle<()>,
    decay_task: JoinHandle<()>,
    sampler_task: JoinHandle<()>,
}

impl TelemetryHandle {
    /// Stops the export, decay and sampler timers.
    pub fn stop(&self) {
        self.export_task.abort();
        self.decay_task.abort();
        self.sampler_task.abort();
    }
}

/// Spawns the export cycle, the active-user decay cycle and the CPU sampler.
///
/// The three timers are independent and unsynchronized; the first export
/// fires one full period after startup.
pub fn spawn_telemetry_tasks(metrics: Metrics, config: MetricsConfig) -> TelemetryHandle {
    let export_period = Duration::from_millis(config.export_period_ms);
    let decay_period = Duration::from_millis(config.decay_period_ms);
    let sampler_period = Duration::from_millis(config.cpu_sample_period_ms);

    let sampler_task = system::spawn_cpu_sampler(metrics.clone(), sampler_period);

    let exporter = MetricsExporter::new(metrics.clone(), config);
    let export_task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + export_period, export_period);
        loop {
            ticker.tick().await;
            exporter.export_once().await;
        }
    });

    let decay_task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + decay_period, decay_period);
        loop {
            ticker.tick().await;
            metrics.decay_active_users();
        }
    });

    TelemetryHandle {
        export_task,
        decay_task,
        sampler_task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::recorder::MetricsRecorder;
    use http::Method;
    use serde_json::Value;

    fn test_config() -> MetricsConfig {
        MetricsConfig {
            url: "http://127.0.0.1:9/".to_string(),
            api_key: "test-api-key".to_string(),
            source: "pizza-service-test".to_string(),
            export_period_ms: 15_000,
            decay_period_ms: 2_000_000,
            cpu_sample_period_ms: 5_000,
        }
    }

    fn metric_json(payload: &MetricPayload) -> Value {
        let json = serde_json::to_value(payload).expect("payload should serialize");
        json["resourceMetrics"][0]["scopeMetrics"][0]["metrics"][0].clone()
    }

    #[test]
    fn one_record_per_metric_in_push_order() {
        let exporter = MetricsExporter::new(Metrics::new(), test_config());
        let payloads = exporter.build_payloads(&exporter.metrics.snapshot(), 0.0);

        let names: Vec<String> = payloads
            .iter()
            .map(|p| metric_json(p)["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            [
                "GET",
                "POST",
                "PUT",
                "DELETE",
                "TOTAL",
                "CPU",
                "MEMORY",
                "GEN_LATENCY",
                "PIZZA_LATENCY",
                "ACTIVE_USERS",
                "SOLD",
                "FAILED_PIZZAS",
                "REVENUE",
                "SUCCESSFUL",
                "FAILED"
            ]
        );
    }

    #[test]
    fn http_counters_export_as_monotonic_sums() {
        let metrics = Metrics::new();
        metrics.record_http_request(&Method::GET);
        metrics.record_http_request(&Method::GET);
        metrics.record_http_request(&Method::POST);

        let exporter = MetricsExporter::new(metrics, test_config());
        let payloads = exporter.build_payloads(&exporter.metrics.snapshot(), 0.0);

        let get = metric_json(&payloads[0]);
        assert_eq!(get["name"], "GET");
        assert_eq!(get["sum"]["isMonotonic"], true);
        assert_eq!(get["sum"]["dataPoints"][0]["asInt"], 2);

        let total = metric_json(&payloads[4]);
        assert_eq!(total["name"], "TOTAL");
        assert_eq!(total["sum"]["dataPoints"][0]["asInt"], 3);
    }

    #[test]
    fn system_gauges_export_as_gauges_with_doubles() {
        let metrics = Metrics::new();
        metrics.set_cpu_usage(12.5);

        let exporter = MetricsExporter::new(metrics, test_config());
        let payloads = exporter.build_payloads(&exporter.metrics.snapshot(), 54.32);

        let cpu = metric_json(&payloads[5]);
        assert_eq!(cpu["gauge"]["dataPoints"][0]["asDouble"], 12.5);
        assert_eq!(cpu["unit"], "%");

        let memory = metric_json(&payloads[6]);
        assert_eq!(memory["gauge"]["dataPoints"][0]["asDouble"], 54.32);
    }

    #[test]
    fn revenue_exports_as_double_even_when_whole() {
        let metrics = Metrics::new();
        metrics.record_revenue(10.0);

        let exporter = MetricsExporter::new(metrics, test_config());
        let payloads = exporter.build_payloads(&exporter.metrics.snapshot(), 0.0);

        let revenue = metric_json(&payloads[12]);
        assert_eq!(revenue["name"], "REVENUE");
        assert_eq!(revenue["sum"]["dataPoints"][0]["asDouble"], 10.0);
        assert!(revenue["sum"]["dataPoints"][0].get("asInt").is_none());
    }
}
