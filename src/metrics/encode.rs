//! OTLP JSON payload construction for the push exporter.
//!
//! One payload carries exactly one metric with one data point, mirroring the
//! collector's `resourceMetrics` / `scopeMetrics` nesting.

use chrono::Utc;
use serde::Serialize;

/// How the collector aggregates a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonically increasing cumulative counter.
    Sum,
    /// Instantaneous value, not accumulated over time.
    Gauge,
}

/// The declared numeric kind of a metric value.
///
/// Declared by the caller instead of inferred from the value at encode time,
/// so a revenue of exactly 10.00 still goes out as `asDouble`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(u64),
    Double(f64),
}

/// A fully built export payload, ready to be serialized and pushed.
#[derive(Debug, Serialize)]
pub struct MetricPayload {
    #[serde(rename = "resourceMetrics")]
    resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Serialize)]
struct ResourceMetrics {
    #[serde(rename = "scopeMetrics")]
    scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Serialize)]
struct ScopeMetrics {
    metrics: Vec<Metric>,
}

#[derive(Debug, Serialize)]
struct Metric {
    name: String,
    unit: String,
    #[serde(flatten)]
    data: MetricData,
}

/// Tagged union selecting the `"sum"` or `"gauge"` key at serialization time.
#[derive(Debug, Serialize)]
enum MetricData {
    #[serde(rename = "sum")]
    Sum {
        #[serde(rename = "dataPoints")]
        data_points: Vec<DataPoint>,
        #[serde(rename = "aggregationTemporality")]
        aggregation_temporality: &'static str,
        #[serde(rename = "isMonotonic")]
        is_monotonic: bool,
    },
    #[serde(rename = "gauge")]
    Gauge {
        #[serde(rename = "dataPoints")]
        data_points: Vec<DataPoint>,
    },
}

#[derive(Debug, Serialize)]
struct DataPoint {
    #[serde(flatten)]
    value: DataPointValue,
    #[serde(rename = "timeUnixNano")]
    time_unix_nano: i64,
    attributes: Vec<Attribute>,
}

#[derive(Debug, Serialize)]
enum DataPointValue {
    #[serde(rename = "asInt")]
    AsInt(u64),
    #[serde(rename = "asDouble")]
    AsDouble(f64),
}

#[derive(Debug, Serialize)]
struct Attribute {
    key: &'static str,
    value: AttributeValue,
}

#[derive(Debug, Serialize)]
struct AttributeValue {
    #[serde(rename = "stringValue")]
    string_value: String,
}

/// Builds the export payload for a single metric, stamped with the current
/// wall-clock time.
pub fn metric_payload(
    name: &str,
    unit: &str,
    kind: MetricKind,
    value: MetricValue,
    source: &str,
) -> MetricPayload {
    metric_payload_at(
        name,
        unit,
        kind,
        value,
        source,
        Utc::now().timestamp_millis() * 1_000_000,
    )
}

fn metric_payload_at(
    name: &str,
    unit: &str,
    kind: MetricKind,
    value: MetricValue,
    source: &str,
    time_unix_nano: i64,
) -> MetricPayload {
    let data_point = DataPoint {
        value: match value {
            MetricValue::Int(v) => DataPointValue::AsInt(v),
            MetricValue::Double(v) => DataPointValue::AsDouble(v),
        },
        time_unix_nano,
        attributes: vec![Attribute {
            key: "source",
            value: AttributeValue {
                string_value: source.to_string(),
            },
        }],
    };

    let data = match kind {
        MetricKind::Sum => MetricData::Sum {
            data_points: vec![data_point],
            aggregation_temporality: "AGGREGATION_TEMPORALITY_CUMULATIVE",
            is_monotonic: true,
        },
        MetricKind::Gauge => MetricData::Gauge {
            data_points: vec![data_point],
        },
    };

    MetricPayload {
        resource_metrics: vec![ResourceMetrics {
            scope_metrics: vec![ScopeMetrics {
                metrics: vec![Metric {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    data,
                }],
            }],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn metric_json(payload: &MetricPayload) -> Value {
        let json = serde_json::to_value(payload).expect("payload should serialize");
        json["resourceMetrics"][0]["scopeMetrics"][0]["metrics"][0].clone()
    }

    #[test]
    fn integral_values_encode_as_int() {
        let payload = metric_payload_at(
            "SOLD",
            "1",
            MetricKind::Sum,
            MetricValue::Int(42),
            "pizza-service-test",
            1_700_000_000_000_000_000,
        );
        let metric = metric_json(&payload);
        let data_point = &metric["sum"]["dataPoints"][0];

        assert_eq!(data_point["asInt"], 42);
        assert!(data_point.get("asDouble").is_none());
        assert_eq!(data_point["timeUnixNano"], 1_700_000_000_000_000_000i64);
    }

    #[test]
    fn fractional_kind_encodes_as_double_even_for_whole_values() {
        let payload = metric_payload_at(
            "REVENUE",
            "1",
            MetricKind::Sum,
            MetricValue::Double(10.0),
            "pizza-service-test",
            0,
        );
        let data_point = &metric_json(&payload)["sum"]["dataPoints"][0];

        assert_eq!(data_point["asDouble"], 10.0);
        assert!(data_point.get("asInt").is_none());
    }

    #[test]
    fn double_values_round_trip() {
        let payload = metric_payload_at(
            "CPU",
            "%",
            MetricKind::Gauge,
            MetricValue::Double(42.5),
            "pizza-service-test",
            0,
        );
        let data_point = &metric_json(&payload)["gauge"]["dataPoints"][0];

        assert_eq!(data_point["asDouble"], 42.5);
    }

    #[test]
    fn sums_carry_cumulative_monotonic_markers() {
        let payload = metric_payload_at(
            "GET",
            "1",
            MetricKind::Sum,
            MetricValue::Int(2),
            "pizza-service-test",
            0,
        );
        let metric = metric_json(&payload);

        assert_eq!(metric["name"], "GET");
        assert_eq!(metric["unit"], "1");
        assert_eq!(
            metric["sum"]["aggregationTemporality"],
            "AGGREGATION_TEMPORALITY_CUMULATIVE"
        );
        assert_eq!(metric["sum"]["isMonotonic"], true);
        assert!(metric.get("gauge").is_none());
    }

    #[test]
    fn gauges_omit_the_sum_markers() {
        let payload = metric_payload_at(
            "MEMORY",
            "%",
            MetricKind::Gauge,
            MetricValue::Double(55.21),
            "pizza-service-test",
            0,
        );
        let metric = metric_json(&payload);

        assert!(metric.get("sum").is_none());
        let gauge = &metric["gauge"];
        assert!(gauge.get("aggregationTemporality").is_none());
        assert!(gauge.get("isMonotonic").is_none());
        assert_eq!(gauge["dataPoints"][0]["asDouble"], 55.21);
    }

    #[test]
    fn every_data_point_is_tagged_with_its_source() {
        let payload = metric_payload(
            "TOTAL",
            "1",
            MetricKind::Sum,
            MetricValue::Int(0),
            "pizza-service-test",
        );
        let attributes = &metric_json(&payload)["sum"]["dataPoints"][0]["attributes"];

        assert_eq!(attributes[0]["key"], "source");
        assert_eq!(attributes[0]["value"]["stringValue"], "pizza-service-test");
    }

    #[test]
    fn timestamp_is_wall_clock_nanoseconds() {
        let payload = metric_payload(
            "CPU",
            "%",
            MetricKind::Gauge,
            MetricValue::Double(0.0),
            "pizza-service-test",
        );
        let nanos = metric_json(&payload)["gauge"]["dataPoints"][0]["timeUnixNano"]
            .as_i64()
            .expect("timestamp should be an integer");

        // After 2020-01-01 in nanoseconds.
        assert!(nanos > 1_577_836_800_000_000_000);
    }
}
