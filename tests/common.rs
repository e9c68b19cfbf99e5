use std::sync::Arc;

use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use pizzatron::config::{Config, ConfigV1};
use pizzatron::metrics::Metrics;
use pizzatron::routes::create_router;
use pizzatron::state::AppState;

#[allow(dead_code)]
pub fn load_test_config(collector_url: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
bind_address: 127.0.0.1:8081
logging:
  level: "warn"
  format: "json"
metrics:
  url: "{collector_url}"
  api_key: "test-api-key"
  source: "pizza-service-test"
"#
    );

    let config: Config = Figment::new()
        .merge(Yaml::string(&yaml))
        .extract()
        .expect("Failed to parse test config YAML");

    match config {
        Config::ConfigV1(cfg) => cfg,
    }
}

#[allow(dead_code)]
pub fn build_app(config: ConfigV1) -> (Router, Metrics) {
    let config = Arc::new(config);
    let metrics = Metrics::new();

    let state = AppState {
        config,
        metrics: metrics.clone(),
    };

    (create_router(state), metrics)
}
