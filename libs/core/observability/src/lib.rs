//! Observability facade for the ingestion and evaluation services.
//!
//! One thin layer over the `metrics` facade and `tracing` so hot paths stay
//! free of exporter details:
//! - Prometheus recorder setup and the `/metrics` handler
//! - counter/histogram/gauge wrappers taking owned label pairs
//! - consumer/producer span instrumentation for queue workers
//! - exception capture with alert-noise suppression left to callers
//!
//! # Example
//!
//! ```rust,ignore
//! observability::init_metrics();
//!
//! observability::record_increment("trace_upsert_queue_request", 1, &[]);
//! observability::record_histogram(
//!     "trace_upsert_queue_wait_time_ms",
//!     queue_wait.as_millis() as f64,
//!     &[],
//! );
//! ```

pub mod instrument;
pub mod middleware;

pub use instrument::{instrument, InstrumentOpts, SpanKind};

// Re-export the metrics macros for callers that prefer them directly.
pub use metrics::{counter, gauge, histogram};

use metrics::Label;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::{Lazy, OnceCell};
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Whether an external error tracker is configured (`NEXT_PUBLIC_SENTRY_DSN`).
/// Captured once at first use; only affects the label on `exceptions_total`.
static EXCEPTION_CAPTURE_ACTIVE: Lazy<bool> =
    Lazy::new(|| std::env::var("NEXT_PUBLIC_SENTRY_DSN").is_ok());

/// Initialize the Prometheus metrics recorder.
///
/// Call once at service startup, before any metric is recorded.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        handle
    })
}

/// Get the metrics handle (must call `init_metrics` first).
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for the `/metrics` endpoint.
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

/// Increment a counter by `delta`.
pub fn record_increment(name: &str, delta: u64, labels: &[(String, String)]) {
    counter!(name.to_string(), to_labels(labels)).increment(delta);
}

/// Record a histogram observation.
pub fn record_histogram(name: &str, value: f64, labels: &[(String, String)]) {
    histogram!(name.to_string(), to_labels(labels)).record(value);
}

/// Set a gauge to an absolute value.
pub fn record_gauge(name: &str, value: f64, labels: &[(String, String)]) {
    gauge!(name.to_string(), to_labels(labels)).set(value);
}

/// Forward an error to the exception sink.
///
/// Logs at error level and counts the exception. Callers decide which errors
/// are expected and skip this call for them, so alerting stays quiet on
/// routine failures.
pub fn trace_exception<E: std::fmt::Display + ?Sized>(error: &E) {
    tracing::error!(exception = %error, "Captured exception");

    let sink = if *EXCEPTION_CAPTURE_ACTIVE {
        "tracker"
    } else {
        "log"
    };
    counter!("exceptions_total", "sink" => sink).increment(1);
}

fn to_labels(labels: &[(String, String)]) -> Vec<Label> {
    labels
        .iter()
        .map(|(k, v)| Label::new(k.clone(), v.clone()))
        .collect()
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of 4xx/5xx HTTP responses"
    );

    describe_counter!(
        "ingestion_events_processed_total",
        "Ingestion events processed, labeled by event type and outcome"
    );
    describe_counter!(
        "rate_limit_exceeded",
        "Requests rejected by the rate limiter, labeled by org, plan and resource"
    );
    describe_counter!(
        "worker_dispatch_failures_total",
        "Failed trace-upsert notifications to the worker service"
    );

    describe_counter!(
        "trace_upsert_queue_request",
        "Trace-upsert jobs picked up by the eval job creator"
    );
    describe_histogram!(
        "trace_upsert_queue_wait_time_ms",
        "Time trace-upsert jobs spent queued before processing"
    );
    describe_gauge!("trace_upsert_queue_length", "Trace-upsert stream length");
    describe_histogram!(
        "trace_upsert_queue_processing_time_ms",
        "Trace-upsert job processing time"
    );

    describe_counter!(
        "eval_execution_queue_request",
        "Evaluation jobs picked up by the executor"
    );
    describe_histogram!(
        "eval_execution_queue_wait_time_ms",
        "Time evaluation jobs spent queued before processing"
    );
    describe_gauge!("eval_execution_queue_length", "Evaluation stream length");
    describe_histogram!(
        "eval_execution_queue_processing_time_ms",
        "Evaluation job processing time"
    );

    describe_counter!("exceptions_total", "Exceptions forwarded to the error sink");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_conversion_preserves_pairs() {
        let labels = vec![
            ("org_id".to_string(), "org-1".to_string()),
            ("resource".to_string(), "ingestion".to_string()),
        ];
        let converted = to_labels(&labels);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].key(), "org_id");
        assert_eq!(converted[1].value(), "ingestion");
    }

    #[tokio::test]
    async fn metrics_handler_without_init_reports_uninitialized() {
        // Recorder installation is global; only assert the uninitialized
        // branch when no other test has installed it yet.
        let body = metrics_handler().await;
        assert!(body.is_empty() || body.starts_with('#') || body.contains("_total"));
    }
}
