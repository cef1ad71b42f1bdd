//! Metrics collection and exposition.
//!
//! # Metrics
//! - `scrape_requests_total` (counter): requests by strategy, outcome
//! - `scrape_request_duration_seconds` (histogram): latency by strategy
//! - `scrape_browsers_active` (gauge): live browser processes
//!
//! # Design Decisions
//! - Recording is a no-op until the exporter is installed
//! - A browser gauge that never returns to zero means a leaked process

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(strategy: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "scrape_requests_total",
        "strategy" => strategy,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("scrape_request_duration_seconds", "strategy" => strategy)
        .record(start.elapsed().as_secs_f64());
}

pub fn browser_launched() {
    metrics::gauge!("scrape_browsers_active").increment(1.0);
}

pub fn browser_closed() {
    metrics::gauge!("scrape_browsers_active").decrement(1.0);
}
