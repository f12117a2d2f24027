// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock carrier for deterministic tests.
//!
//! `MockCarrier` implements `CarrierClient` without network access. It
//! records every request and hands out sequential SIDs; failures can be
//! queued to exercise upstream error paths.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use switchboard_core::{
    AdapterType, CarrierClient, HealthStatus, PlaceCallRequest, PlacedCall, PluginAdapter,
    SendMessageRequest, SentMessage, SwitchboardError,
};

#[derive(Default)]
struct Recorded {
    calls: Vec<PlaceCallRequest>,
    messages: Vec<SendMessageRequest>,
    failures: VecDeque<SwitchboardError>,
}

/// A carrier that never leaves the process.
#[derive(Clone, Default)]
pub struct MockCarrier {
    inner: Arc<Mutex<Recorded>>,
}

impl MockCarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next carrier request fail with `error`.
    pub async fn fail_next(&self, error: SwitchboardError) {
        self.inner.lock().await.failures.push_back(error);
    }

    pub async fn placed_calls(&self) -> Vec<PlaceCallRequest> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn sent_messages(&self) -> Vec<SendMessageRequest> {
        self.inner.lock().await.messages.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockCarrier {
    fn name(&self) -> &str {
        "mock-carrier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Carrier
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[async_trait]
impl CarrierClient for MockCarrier {
    async fn create_call(&self, request: PlaceCallRequest) -> Result<PlacedCall, SwitchboardError> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.failures.pop_front() {
            return Err(error);
        }
        inner.calls.push(request);
        Ok(PlacedCall {
            sid: format!("CAmock{:04}", inner.calls.len()),
            status: "queued".to_string(),
        })
    }

    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SentMessage, SwitchboardError> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.failures.pop_front() {
            return Err(error);
        }
        inner.messages.push(request);
        Ok(SentMessage {
            sid: format!("SMmock{:04}", inner.messages.len()),
            status: "queued".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> SendMessageRequest {
        SendMessageRequest {
            to: "+15559998888".into(),
            from: "+15551234567".into(),
            body: "hi".into(),
            status_callback: None,
        }
    }

    #[tokio::test]
    async fn records_requests_with_sequential_sids() {
        let carrier = MockCarrier::new();
        let first = carrier.send_message(message()).await.unwrap();
        let second = carrier.send_message(message()).await.unwrap();
        assert_eq!(first.sid, "SMmock0001");
        assert_eq!(second.sid, "SMmock0002");
        assert_eq!(carrier.sent_messages().await.len(), 2);
    }

    #[tokio::test]
    async fn queued_failure_applies_once() {
        let carrier = MockCarrier::new();
        carrier.fail_next(SwitchboardError::upstream("down")).await;
        assert!(carrier.send_message(message()).await.is_err());
        assert!(carrier.send_message(message()).await.is_ok());
        assert_eq!(carrier.sent_messages().await.len(), 1);
    }
}
