// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for Switchboard.
//!
//! Installs the metrics-rs Prometheus recorder; the gateway exposes
//! [`PrometheusAdapter::render`] on `/metrics`.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use switchboard_core::{AdapterType, HealthStatus, PluginAdapter, SwitchboardError};

pub use recording::{
    adjust_live_sessions, record_carrier_request, record_ledger_outcome,
    record_notifications_dropped, record_route_decision, record_webhook_latency,
    record_webhook_rejection,
};

/// Prometheus metrics adapter.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, SwitchboardError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            SwitchboardError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_route_decision("inbound", "dial_client");
        record_ledger_outcome("call", "stale");
        record_notifications_dropped(3);
        record_carrier_request("create_call", false);
        record_webhook_rejection();
        adjust_live_sessions(1.0);
        record_webhook_latency("voice", 0.01);
    }

    #[tokio::test]
    async fn adapter_installs_recorder_and_renders() {
        let adapter = PrometheusAdapter::new().unwrap();
        assert_eq!(adapter.name(), "prometheus");
        assert_eq!(adapter.adapter_type(), AdapterType::Observability);
        assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Healthy);

        record_ledger_outcome("call", "inserted");
        let text = adapter.render();
        assert!(text.contains("switchboard_ledger_events_total"));

        // Second install in the same process is refused.
        assert!(PrometheusAdapter::new().is_err());
    }
}
