//! Metrics collection and exposition.
//!
//! # Metrics
//! - `value_bridge_http_requests_total` (counter): requests by method, status
//! - `value_bridge_http_request_duration_seconds` (histogram): latency distribution
//! - `value_bridge_rpc_calls_total` (counter): node calls by method, outcome
//! - `value_bridge_rpc_call_duration_seconds` (histogram): node latency by method
//! - `value_bridge_ledger_appends_total` (counter): appended records by source
//! - `value_bridge_syncs_total` (counter): sync attempts by `updated`
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::ledger::RecordSource;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "value_bridge_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "value_bridge_http_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one JSON-RPC call to the node.
pub fn record_rpc_call(method: &'static str, ok: bool, start: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(
        "value_bridge_rpc_calls_total",
        "method" => method,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("value_bridge_rpc_call_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_ledger_append(source: RecordSource) {
    counter!("value_bridge_ledger_appends_total", "source" => source.as_str()).increment(1);
}

pub fn record_sync(updated: bool) {
    let updated = if updated { "true" } else { "false" };
    counter!("value_bridge_syncs_total", "updated" => updated).increment(1);
}
