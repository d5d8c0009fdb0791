//! Metrics collection and exposition.
//!
//! # Metrics
//! - `multiroute_requests_total` (counter): requests by status
//! - `multiroute_request_duration_seconds` (histogram): end-to-end latency
//! - `multiroute_dispatch_candidates` (histogram): candidates per dispatch
//! - `multiroute_dispatch_duration_seconds` (histogram): dispatch latency by result
//! - `multiroute_declines_total` (counter): declines by handler
//! - `multiroute_handler_duration_seconds` (histogram): per-handler latency,
//!   recorded by `TracingTelemetry`
//! - `multiroute_config_reloads_total` (counter): reloads by result

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("multiroute_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("multiroute_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch(candidates: usize, ok: bool, start: Instant) {
    let result = if ok { "ok" } else { "error" };
    metrics::histogram!("multiroute_dispatch_candidates").record(candidates as f64);
    metrics::histogram!("multiroute_dispatch_duration_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_decline(handler: &str) {
    metrics::counter!("multiroute_declines_total", "handler" => handler.to_string()).increment(1);
}

pub fn record_handler(handler: &str, outcome: &'static str, seconds: f64) {
    metrics::histogram!(
        "multiroute_handler_duration_seconds",
        "handler" => handler.to_string(),
        "outcome" => outcome
    )
    .record(seconds);
}

pub fn record_reload(ok: bool) {
    let result = if ok { "ok" } else { "rejected" };
    metrics::counter!("multiroute_config_reloads_total", "result" => result).increment(1);
}
