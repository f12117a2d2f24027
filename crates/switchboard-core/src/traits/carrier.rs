// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier client trait for placing calls and sending messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SwitchboardError;
use crate::traits::adapter::PluginAdapter;

/// Request to originate a call through the carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCallRequest {
    pub to: String,
    pub from: String,
    /// Fetched by the carrier when the call is answered.
    pub answer_url: String,
    pub status_callback: String,
    pub record: bool,
}

/// Carrier acknowledgement of a placed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedCall {
    pub sid: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    pub from: String,
    pub body: String,
    pub status_callback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub sid: String,
    pub status: String,
}

/// The external telephony carrier.
///
/// Injected into the routing engine so tests can substitute a fake.
#[async_trait]
pub trait CarrierClient: PluginAdapter {
    async fn create_call(&self, request: PlaceCallRequest) -> Result<PlacedCall, SwitchboardError>;

    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SentMessage, SwitchboardError>;
}
