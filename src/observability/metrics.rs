//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_requests_total` (counter): RPC calls by method, outcome
//! - `rpc_retries_total` (counter): read-call retries by method
//! - `payments_total` (counter): processed payments by mode, outcome
//! - `payment_failures_total` (counter): failures by pipeline stage
//! - `escrows_active` (gauge): escrows currently in active status
//! - `escrow_transitions_total` (counter): state transitions by target status
//! - `escrows_swept_total` (counter): escrows expired by the sweeper
//! - `fraud_detections_total` (counter): attempts flagged as fraud
//! - `security_events_total` (counter): audit events by risk level
//! - `rpc_endpoint_healthy` (gauge): 1=healthy, 0=unhealthy

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

pub fn record_rpc_call(method: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("rpc_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_rpc_retry(method: &str) {
    counter!("rpc_retries_total", "method" => method.to_string()).increment(1);
}

pub fn record_endpoint_health(healthy: bool) {
    gauge!("rpc_endpoint_healthy").set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_payment(mode: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "failed" };
    counter!("payments_total", "mode" => mode, "outcome" => outcome).increment(1);
}

pub fn record_payment_failure(stage: &'static str) {
    counter!("payment_failures_total", "stage" => stage).increment(1);
}

pub fn record_active_escrows(count: usize) {
    gauge!("escrows_active").set(count as f64);
}

pub fn record_escrow_transition(to: &'static str) {
    counter!("escrow_transitions_total", "to" => to).increment(1);
}

pub fn record_escrow_swept() {
    counter!("escrows_swept_total").increment(1);
}

pub fn record_fraud_detection() {
    counter!("fraud_detections_total").increment(1);
}

pub fn record_security_event(level: &'static str) {
    counter!("security_events_total", "level" => level).increment(1);
}
