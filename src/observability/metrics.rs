//! Metrics collection and exposition.
//!
//! # Metrics
//! - `duty_frames_received_total` (counter): payload frames read from the source
//! - `duty_dispatched_total` (counter): duties handed to a lane, by category
//! - `duty_dropped_total` (counter): duties not dispatched, by reason
//! - `duty_completed_total` (counter): processor completions, by category and outcome
//! - `duty_processing_seconds` (histogram): processor duration, by category
//! - `duty_in_flight` (gauge): processors currently running
//! - `duty_connection_releases_total` (counter): connection releases
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Labels are bounded (category labels, never validator ids)

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::duty::Category;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_frame_received() {
    metrics::counter!("duty_frames_received_total").increment(1);
}

pub fn record_dispatched(category: &Category) {
    metrics::counter!("duty_dispatched_total", "category" => category.label()).increment(1);
}

pub fn record_dropped(reason: &'static str) {
    metrics::counter!("duty_dropped_total", "reason" => reason).increment(1);
}

pub fn record_completed(category: &Category, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "duty_completed_total",
        "category" => category.label(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("duty_processing_seconds", "category" => category.label())
        .record(elapsed.as_secs_f64());
}

pub fn record_in_flight_entered() {
    metrics::gauge!("duty_in_flight").increment(1.0);
}

pub fn record_in_flight_exited() {
    metrics::gauge!("duty_in_flight").decrement(1.0);
}

pub fn record_connection_released() {
    metrics::counter!("duty_connection_releases_total").increment(1);
}
