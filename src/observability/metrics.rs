//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_session_connects_total` (counter): logins by adapter, outcome
//! - `wallet_session_rpc_calls_total` (counter): chain calls by operation, outcome
//! - `wallet_session_connected` (gauge): 1 while a provider is active
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{WalletError, WalletResult};

fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}

pub fn record_connect(adapter: &str, ok: bool) {
    counter!(
        "wallet_session_connects_total",
        "adapter" => adapter.to_string(),
        "outcome" => outcome(ok)
    )
    .increment(1);
}

pub fn record_rpc_call(operation: &'static str, ok: bool) {
    counter!(
        "wallet_session_rpc_calls_total",
        "operation" => operation,
        "outcome" => outcome(ok)
    )
    .increment(1);
}

pub fn set_connected(connected: bool) {
    gauge!("wallet_session_connected").set(if connected { 1.0 } else { 0.0 });
}

/// Install the Prometheus recorder and return a handle for rendering.
pub fn install_prometheus() -> WalletResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WalletError::Initialization(format!("cannot install metrics recorder: {}", e)))?;
    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_connect("openlogin", true);
        record_rpc_call("eth_chainId", false);
        set_connected(true);
    }
}
