//! Prometheus metrics for quoteguard.
//!
//! Covers:
//! - Submit filter decisions (kept / dropped / transformed)
//! - Gateway attempts and their outcome
//! - Credential and egress route rotation
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which must crash at first use rather than
//! silently drop data.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_counter_vec, CounterVec, IntCounterVec};

use crate::error::{TelemetryError, TelemetryResult};

/// Operations seen by the maker-mode filter.
/// Labels: outcome (kept/dropped/transformed)
pub static FILTER_OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "qg_filter_ops_total",
        "Operations processed by the maker-mode filter",
        &["outcome"]
    )
    .unwrap()
});

/// Filter invocations.
/// Labels: result (ok/error)
pub static FILTER_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "qg_filter_runs_total",
        "Maker-mode filter invocations",
        &["result"]
    )
    .unwrap()
});

/// Gateway request attempts.
/// Labels: method (GET/POST), outcome (ok/transport/status/unsuccessful/decode)
pub static GATEWAY_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "qg_gateway_attempts_total",
        "Venue request attempts by outcome",
        &["method", "outcome"]
    )
    .unwrap()
});

/// Credential selections by rotation index.
pub static GATEWAY_CREDENTIAL_SELECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "qg_gateway_credential_selected_total",
        "Signed calls per credential index",
        &["index"]
    )
    .unwrap()
});

/// Egress tunnel re-establishments.
/// Labels: route, outcome (ok/error)
pub static EGRESS_RECYCLE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "qg_egress_recycle_total",
        "Egress route tunnel re-establishments",
        &["route", "outcome"]
    )
    .unwrap()
});

/// Seconds spent sleeping in gateway backoff.
pub static GATEWAY_BACKOFF_SECONDS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "qg_gateway_backoff_seconds_total",
        "Seconds spent in gateway retry backoff",
        &["method"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record the per-invocation filter counters.
    pub fn filter_applied(kept: usize, dropped: usize, transformed: usize) {
        FILTER_OPS_TOTAL
            .with_label_values(&["kept"])
            .inc_by(kept as u64);
        FILTER_OPS_TOTAL
            .with_label_values(&["dropped"])
            .inc_by(dropped as u64);
        FILTER_OPS_TOTAL
            .with_label_values(&["transformed"])
            .inc_by(transformed as u64);
        FILTER_RUNS_TOTAL.with_label_values(&["ok"]).inc();
    }

    /// Record a filter invocation that returned an error.
    pub fn filter_failed() {
        FILTER_RUNS_TOTAL.with_label_values(&["error"]).inc();
    }

    /// Record one gateway attempt.
    pub fn gateway_attempt(method: &str, outcome: &str) {
        GATEWAY_ATTEMPTS_TOTAL
            .with_label_values(&[method, outcome])
            .inc();
    }

    /// Record which credential index served a signed call.
    pub fn credential_selected(index: usize) {
        let index = index.to_string();
        GATEWAY_CREDENTIAL_SELECTED_TOTAL
            .with_label_values(&[index.as_str()])
            .inc();
    }

    /// Record an egress tunnel re-establishment.
    pub fn egress_recycled(route: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        EGRESS_RECYCLE_TOTAL
            .with_label_values(&[route, outcome])
            .inc();
    }

    /// Record time spent in backoff before the next attempt.
    pub fn gateway_backoff(method: &str, seconds: f64) {
        GATEWAY_BACKOFF_SECONDS
            .with_label_values(&[method])
            .inc_by(seconds);
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buf = Vec::new();
        encoder
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
