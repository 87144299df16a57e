//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_connect_attempts_total` (counter): connect calls by provider kind
//! - `wallet_connect_outcomes_total` (counter): connect results by kind and outcome
//! - `wallet_connection_state` (gauge): 0=disconnected 1=connecting 2=connected 3=disconnecting
//! - `wallet_gas_fetch_total` (counter): gas price reads by outcome
//! - `wallet_gas_price_gwei` (gauge): last successful quote
//! - `wallet_session_recoveries_total` (counter): stale session recoveries by kind
//! - `wallet_storage_keys_purged_total` (counter): relay keys removed from storage
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::adapter::ProviderKind;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(%addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(%addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_connect_attempt(kind: ProviderKind) {
    counter!("wallet_connect_attempts_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_connect_outcome(kind: ProviderKind, outcome: &'static str) {
    counter!("wallet_connect_outcomes_total", "kind" => kind.to_string(), "outcome" => outcome).increment(1);
}

pub fn record_connection_state(code: u8) {
    gauge!("wallet_connection_state").set(f64::from(code));
}

pub fn record_gas_fetch(outcome: &'static str) {
    counter!("wallet_gas_fetch_total", "outcome" => outcome).increment(1);
}

pub fn record_gas_price_gwei(gwei: f64) {
    gauge!("wallet_gas_price_gwei").set(gwei);
}

pub fn record_session_recovery(kind: ProviderKind) {
    counter!("wallet_session_recoveries_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_keys_purged(count: usize) {
    counter!("wallet_storage_keys_purged_total").increment(count as u64);
}
