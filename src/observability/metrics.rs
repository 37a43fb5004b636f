//! Metrics collection and exposition.
//!
//! # Metrics
//! - `automation_requests_total` (counter): requests by automation, exit code
//! - `automation_request_duration_seconds` (histogram): wall time per request
//! - `automation_timeouts_total` (counter): requests answered with a timeout
//! - `config_reloads_total` (counter): rebuilds by outcome
//! - `config_reload_duration_seconds` (histogram): rebuild latency
//! - `config_forced_reloads_total` (counter): rebuilds paid for by a request
//! - `config_change_events_total` (counter): relevant filesystem changes
//! - `config_snapshot_generation` (gauge): generation currently published
//!
//! Recording is a no-op until [`init_metrics`] installs an exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_automation(name: &str, exit_code: i32, start: Instant) {
    counter!(
        "automation_requests_total",
        "automation" => name.to_string(),
        "exit_code" => exit_code.to_string()
    )
    .increment(1);
    histogram!("automation_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_timeout() {
    counter!("automation_timeouts_total").increment(1);
}

pub fn record_reload(outcome: &'static str, start: Instant) {
    counter!("config_reloads_total", "outcome" => outcome).increment(1);
    histogram!("config_reload_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_forced_reload() {
    counter!("config_forced_reloads_total").increment(1);
}

pub fn record_change_event() {
    counter!("config_change_events_total").increment(1);
}

pub fn record_snapshot_generation(generation: u64) {
    gauge!("config_snapshot_generation").set(generation as f64);
}
