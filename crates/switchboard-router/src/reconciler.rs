// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies carrier status events to the ledger and publishes the result.
//!
//! Every delivery is applied through the storage adapter's atomic upsert,
//! which merges under the status lattice. A stale or duplicate event is a
//! normal outcome: it is logged and counted but never reported as an error,
//! because the carrier has already delivered it successfully.

use std::sync::Arc;

use tracing::{debug, info, warn};

use switchboard_bus::{EventBus, LiveUpdate};
use switchboard_core::{
    ApplyOutcome, CallRecord, CallStatusEvent, Direction, IgnoreReason, LedgerWrite,
    MessageRecord, MessageStatusEvent, Ownership, PhoneNumber, StorageAdapter, SwitchboardError,
};

use crate::identity::SignalingIdentity;

/// Ledger writer shared by webhooks and the routing engine.
#[derive(Clone)]
pub struct Reconciler {
    storage: Arc<dyn StorageAdapter>,
    bus: EventBus,
}

impl Reconciler {
    pub fn new(storage: Arc<dyn StorageAdapter>, bus: EventBus) -> Self {
        Self { storage, bus }
    }

    /// Apply a carrier-delivered call event, discovering the owning tenant
    /// from its numbers when the call is not yet known.
    pub async fn apply_call_event(
        &self,
        event: CallStatusEvent,
    ) -> Result<LedgerWrite<CallRecord>, SwitchboardError> {
        let ownership = if event.status.is_some() {
            self.resolve_ownership(event.to.as_deref(), event.from.as_deref())
                .await?
        } else {
            None
        };
        self.apply_call_event_as(event, ownership).await
    }

    /// Apply a call event with ownership already decided by the caller.
    pub async fn apply_call_event_as(
        &self,
        event: CallStatusEvent,
        ownership: Option<Ownership>,
    ) -> Result<LedgerWrite<CallRecord>, SwitchboardError> {
        let write = self
            .storage
            .apply_call_event(&event, ownership.as_ref())
            .await?;

        let label = write.outcome.label();
        switchboard_prometheus::record_ledger_outcome("call", label);
        match write.outcome {
            ApplyOutcome::Applied { created } => {
                debug!(
                    call_sid = %event.call_sid,
                    event_id = %event.event_id,
                    outcome = label,
                    "call event applied"
                );
                if let Some(record) = &write.record {
                    self.bus.publish(LiveUpdate::call(record.clone(), created));
                }
            }
            ApplyOutcome::Ignored(IgnoreReason::Stale) => {
                info!(
                    call_sid = %event.call_sid,
                    event_id = %event.event_id,
                    current = ?write.record.as_ref().map(|r| r.status),
                    rejected = ?event.status,
                    "stale call status ignored"
                );
            }
            ApplyOutcome::Ignored(IgnoreReason::Duplicate) => {
                debug!(call_sid = %event.call_sid, event_id = %event.event_id, "duplicate call event");
            }
            ApplyOutcome::NotFound => {
                warn!(
                    call_sid = %event.call_sid,
                    event_id = %event.event_id,
                    "call event for unknown call and unregistered numbers"
                );
            }
        }
        Ok(write)
    }

    /// Apply a carrier-delivered message event.
    pub async fn apply_message_event(
        &self,
        event: MessageStatusEvent,
    ) -> Result<LedgerWrite<MessageRecord>, SwitchboardError> {
        let ownership = if event.status.is_some() {
            self.resolve_ownership(event.to.as_deref(), event.from.as_deref())
                .await?
        } else {
            None
        };
        self.apply_message_event_as(event, ownership).await
    }

    pub async fn apply_message_event_as(
        &self,
        event: MessageStatusEvent,
        ownership: Option<Ownership>,
    ) -> Result<LedgerWrite<MessageRecord>, SwitchboardError> {
        let write = self
            .storage
            .apply_message_event(&event, ownership.as_ref())
            .await?;

        let label = write.outcome.label();
        switchboard_prometheus::record_ledger_outcome("message", label);
        match write.outcome {
            ApplyOutcome::Applied { created } => {
                debug!(message_sid = %event.message_sid, outcome = label, "message event applied");
                if let Some(record) = &write.record {
                    self.bus.publish(LiveUpdate::message(record.clone(), created));
                }
            }
            ApplyOutcome::Ignored(IgnoreReason::Stale) => {
                info!(
                    message_sid = %event.message_sid,
                    event_id = %event.event_id,
                    current = ?write.record.as_ref().map(|r| r.status),
                    rejected = ?event.status,
                    "stale message status ignored"
                );
            }
            ApplyOutcome::Ignored(IgnoreReason::Duplicate) => {
                debug!(message_sid = %event.message_sid, "duplicate message event");
            }
            ApplyOutcome::NotFound => {
                warn!(
                    message_sid = %event.message_sid,
                    event_id = %event.event_id,
                    "message event for unknown message and unregistered numbers"
                );
            }
        }
        Ok(write)
    }

    /// Owner of a leg: the tenant owning `To` (inbound), else the tenant
    /// owning or registered as `From` (outbound).
    async fn resolve_ownership(
        &self,
        to: Option<&str>,
        from: Option<&str>,
    ) -> Result<Option<Ownership>, SwitchboardError> {
        if let Some(to) = to.and_then(|raw| PhoneNumber::parse(raw).ok())
            && let Some(owner) = self.storage.resolve_owner(to.as_str()).await?
        {
            return Ok(Some(Ownership {
                tenant_id: owner.tenant_id,
                direction: Direction::Inbound,
            }));
        }

        match from.map(SignalingIdentity::parse) {
            Some(SignalingIdentity::BrowserClient(tenant_id)) => Ok(Some(Ownership {
                tenant_id,
                direction: Direction::Outbound,
            })),
            Some(SignalingIdentity::CarrierNumber(number)) => Ok(self
                .storage
                .resolve_owner(number.as_str())
                .await?
                .map(|owner| Ownership {
                    tenant_id: owner.tenant_id,
                    direction: Direction::Outbound,
                })),
            _ => Ok(None),
        }
    }
}
