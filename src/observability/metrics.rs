//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): feed requests by shape, outcome
//! - `gateway_request_duration_seconds` (histogram): end-to-end feed latency by shape
//! - `gateway_query_duration_seconds` (histogram): live query latency by protocol
//! - `gateway_queries_total` (counter): live queries by protocol, result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Outcome labels are error kinds, never raw error text

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::envelope::Shape;

pub const REQUESTS_TOTAL: &str = "gateway_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "gateway_request_duration_seconds";
pub const QUERIES_TOTAL: &str = "gateway_queries_total";
pub const QUERY_DURATION_SECONDS: &str = "gateway_query_duration_seconds";

/// Outcome label for a successful feed request.
pub const OUTCOME_OK: &str = "ok";

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must run inside the tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics exporter installed");
    Ok(())
}

/// Record one finished feed request.
pub fn record_request(shape: Shape, outcome: &'static str, started: Instant) {
    metrics::counter!(REQUESTS_TOTAL, "shape" => shape.label(), "outcome" => outcome).increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, "shape" => shape.label())
        .record(started.elapsed().as_secs_f64());
}

/// Record one live query, successful or not.
pub fn record_query(protocol: &str, ok: bool, started: Instant) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!(QUERIES_TOTAL, "protocol" => protocol.to_string(), "result" => result)
        .increment(1);
    metrics::histogram!(QUERY_DURATION_SECONDS, "protocol" => protocol.to_string())
        .record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request(Shape::Multi, OUTCOME_OK, Instant::now());
        record_query("quake3", false, Instant::now());
    }

    #[test]
    fn test_render_local_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_request(Shape::Single, "validation", Instant::now());
        });
        let output = handle.render();
        assert!(output.contains(REQUESTS_TOTAL));
        assert!(output.contains(r#"shape="single""#));
        assert!(output.contains(r#"outcome="validation""#));
    }

    #[test]
    fn test_metric_names_are_snake_case() {
        let names = [
            REQUESTS_TOTAL,
            REQUEST_DURATION_SECONDS,
            QUERIES_TOTAL,
            QUERY_DURATION_SECONDS,
        ];
        for name in names {
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{name}");
        }
    }
}
