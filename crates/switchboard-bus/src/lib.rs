// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live fan-out of ledger changes to a tenant's connected clients.
//!
//! The reconciler publishes after its write has committed. Publishing never
//! blocks and never fails the caller: with no subscribers the update is
//! discarded, and a subscriber that falls behind skips the updates it missed.
//! Clients re-fetch history on reconnect, so nothing here is retried.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use switchboard_core::{CallRecord, MessageRecord, TenantId};

/// Default number of updates buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// A committed ledger change, as pushed to live clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "record")]
pub enum LiveUpdate {
    #[serde(rename = "call.inserted")]
    CallInserted(CallRecord),
    #[serde(rename = "call.updated")]
    CallUpdated(CallRecord),
    #[serde(rename = "message.inserted")]
    MessageInserted(MessageRecord),
    #[serde(rename = "message.updated")]
    MessageUpdated(MessageRecord),
}

impl LiveUpdate {
    pub fn call(record: CallRecord, created: bool) -> Self {
        if created {
            LiveUpdate::CallInserted(record)
        } else {
            LiveUpdate::CallUpdated(record)
        }
    }

    pub fn message(record: MessageRecord, created: bool) -> Self {
        if created {
            LiveUpdate::MessageInserted(record)
        } else {
            LiveUpdate::MessageUpdated(record)
        }
    }

    /// Tenant that owns the changed record.
    pub fn tenant_id(&self) -> &str {
        match self {
            LiveUpdate::CallInserted(r) | LiveUpdate::CallUpdated(r) => &r.tenant_id,
            LiveUpdate::MessageInserted(r) | LiveUpdate::MessageUpdated(r) => &r.tenant_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LiveUpdate::CallInserted(_) => "call.inserted",
            LiveUpdate::CallUpdated(_) => "call.updated",
            LiveUpdate::MessageInserted(_) => "message.inserted",
            LiveUpdate::MessageUpdated(_) => "message.updated",
        }
    }

    /// Wire payload: `{"type": "...", "record": {...}}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Process-wide broadcast of ledger changes.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Arc<LiveUpdate>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a change. Returns the number of subscribers that received it.
    pub fn publish(&self, update: LiveUpdate) -> usize {
        let kind = update.kind();
        match self.tx.send(Arc::new(update)) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(kind, "no live subscribers, update discarded");
                0
            }
        }
    }

    /// Subscribe to changes for one tenant.
    pub fn subscribe(&self, tenant_id: TenantId) -> TenantSubscription {
        TenantSubscription {
            tenant_id,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiving half filtered to a single tenant.
pub struct TenantSubscription {
    tenant_id: TenantId,
    rx: broadcast::Receiver<Arc<LiveUpdate>>,
}

impl TenantSubscription {
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Wait for the next update owned by this tenant.
    ///
    /// Returns `None` once the bus has been dropped.
    pub async fn next(&mut self) -> Option<Arc<LiveUpdate>> {
        loop {
            match self.rx.recv().await {
                Ok(update) if update.tenant_id() == self.tenant_id.as_str() => {
                    return Some(update);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(
                        tenant_id = %self.tenant_id,
                        missed,
                        "live subscriber lagged, updates dropped"
                    );
                    switchboard_prometheus::record_notifications_dropped(missed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
