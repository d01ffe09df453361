//! Metrics collection and exposition.
//!
//! # Metrics
//! - `asset_requests_total` (counter): asset requests by source, status
//! - `asset_request_duration_seconds` (histogram): time to first byte
//! - `asset_cache_commits_total` (counter): cache promotions by outcome
//! - `asset_upstream_bytes_total` (counter): bytes copied from the provider
//! - `app_requests_total` (counter): non-asset requests by route, status

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_asset_request(source: &'static str, status: u16, start: Instant) {
    counter!("asset_requests_total", "source" => source, "status" => status.to_string()).increment(1);
    histogram!("asset_request_duration_seconds", "source" => source)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_commit(outcome: &'static str) {
    counter!("asset_cache_commits_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream_bytes(bytes: u64) {
    counter!("asset_upstream_bytes_total").increment(bytes);
}

pub fn record_app_request(route: &'static str, status: u16) {
    counter!("app_requests_total", "route" => route, "status" => status.to_string()).increment(1);
}
