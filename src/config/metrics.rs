use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings for the metrics push exporter.
///
/// `url` and `api_key` identify the remote collector; `source` tags every
/// exported data point with the reporting service.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct MetricsConfig {
    pub url: String,
    pub api_key: String,
    pub source: String,
    /// Period of the export cycle in milliseconds.
    #[serde(default = "default_export_period_ms")]
    pub export_period_ms: u64,
    /// Period of the active-user decay timer in milliseconds.
    #[serde(default = "default_decay_period_ms")]
    pub decay_period_ms: u64,
    /// Period of the background CPU sampler in milliseconds.
    #[serde(default = "default_cpu_sample_period_ms")]
    pub cpu_sample_period_ms: u64,
}

fn default_export_period_ms() -> u64 {
    15_000
}

fn default_decay_period_ms() -> u64 {
    2_000_000
}

fn default_cpu_sample_period_ms() -> u64 {
    5_000
}
