//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): finished requests by method, status
//! - `http_request_duration_seconds` (histogram): latency by method
//! - `http_errors_total` (counter): classified errors by kind
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished request. `status` is `None` when the client went away
/// before a response existed.
pub fn record_request(method: &str, status: Option<u16>, elapsed: Duration) {
    let status = status.map_or_else(|| "aborted".to_string(), |s| s.to_string());
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record an error that reached the classifier.
pub fn record_error(kind: &str) {
    metrics::counter!("http_errors_total", "kind" => kind.to_string()).increment(1);
}
