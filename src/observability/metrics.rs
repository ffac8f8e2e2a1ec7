//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_resolutions_total` (counter): resolutions by route, outcome
//! - `router_view_loads_total` (counter): view loads by module, result
//! - `router_view_load_duration_seconds` (histogram): view load latency
//! - `router_view_cache_size` (gauge): cached view modules
//! - `router_navigations_superseded_total` (counter): stale navigations dropped
//! - `router_navigations_aborted_total` (counter): navigations stopped by a hook
//! - `router_table_reloads_total` (counter): route table swaps by result
//! - `router_http_requests_total` (counter): host requests by status

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::routing::ResolutionOutcome;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_resolution(route: &str, outcome: ResolutionOutcome) {
    counter!(
        "router_resolutions_total",
        "route" => route.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_view_load(module: &str, result: &'static str, start: Instant) {
    counter!(
        "router_view_loads_total",
        "module" => module.to_string(),
        "result" => result
    )
    .increment(1);
    histogram!("router_view_load_duration_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_view_cache_size(size: usize) {
    gauge!("router_view_cache_size").set(size as f64);
}

pub fn record_superseded() {
    counter!("router_navigations_superseded_total").increment(1);
}

pub fn record_aborted() {
    counter!("router_navigations_aborted_total").increment(1);
}

pub fn record_table_reload(result: &'static str) {
    counter!("router_table_reloads_total", "result" => result).increment(1);
}

pub fn record_http_request(status: u16, start: Instant) {
    counter!("router_http_requests_total", "status" => status.to_string()).increment(1);
    histogram!("router_http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
