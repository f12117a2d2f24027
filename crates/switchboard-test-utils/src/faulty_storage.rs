// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper for exercising slow or failing ledgers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use switchboard_core::{
    ActivityStats, AdapterType, CallRecord, CallStatusEvent, Capability, Conversation,
    HealthStatus, LedgerWrite, MessageRecord, MessageStatusEvent, NewTenantNumber, NumberOwner,
    Ownership, PluginAdapter, StorageAdapter, SwitchboardError, TenantId, TenantNumber,
};

/// Wraps a real ledger and injects delays or write failures.
///
/// Lookups on the webhook path (`resolve_owner`, `get_call`) and call writes
/// sleep for the configured stall first. Everything else is delegated as is.
pub struct FaultyStorage {
    inner: Arc<dyn StorageAdapter>,
    stall: Option<Duration>,
    fail_call_writes: bool,
}

impl FaultyStorage {
    pub fn new(inner: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner,
            stall: None,
            fail_call_writes: false,
        }
    }

    /// Delay webhook-path lookups and call writes by `stall`.
    pub fn stall_for(mut self, stall: Duration) -> Self {
        self.stall = Some(stall);
        self
    }

    /// Make every call ledger write fail with a storage error.
    pub fn failing_call_writes(mut self) -> Self {
        self.fail_call_writes = true;
        self
    }

    async fn stall(&self) {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
    }
}

#[async_trait]
impl PluginAdapter for FaultyStorage {
    fn name(&self) -> &str {
        "faulty-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 0, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        self.inner.adapter_type()
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FaultyStorage {
    async fn initialize(&self) -> Result<(), SwitchboardError> {
        self.inner.initialize().await
    }

    async fn register_number(
        &self,
        number: NewTenantNumber,
    ) -> Result<TenantNumber, SwitchboardError> {
        self.inner.register_number(number).await
    }

    async fn release_number(
        &self,
        tenant_id: &TenantId,
        number: &str,
    ) -> Result<TenantNumber, SwitchboardError> {
        self.inner.release_number(tenant_id, number).await
    }

    async fn resolve_owner(&self, number: &str) -> Result<Option<NumberOwner>, SwitchboardError> {
        self.stall().await;
        self.inner.resolve_owner(number).await
    }

    async fn list_numbers(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<TenantNumber>, SwitchboardError> {
        self.inner.list_numbers(tenant_id).await
    }

    async fn latest_capable_number(
        &self,
        tenant_id: &TenantId,
        capability: Capability,
    ) -> Result<Option<TenantNumber>, SwitchboardError> {
        self.inner.latest_capable_number(tenant_id, capability).await
    }

    async fn apply_call_event(
        &self,
        event: &CallStatusEvent,
        ownership: Option<&Ownership>,
    ) -> Result<LedgerWrite<CallRecord>, SwitchboardError> {
        self.stall().await;
        if self.fail_call_writes {
            return Err(SwitchboardError::storage(std::io::Error::other(
                "call ledger unavailable",
            )));
        }
        self.inner.apply_call_event(event, ownership).await
    }

    async fn get_call(&self, call_sid: &str) -> Result<Option<CallRecord>, SwitchboardError> {
        self.stall().await;
        self.inner.get_call(call_sid).await
    }

    async fn list_calls(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<CallRecord>, SwitchboardError> {
        self.inner.list_calls(tenant_id, limit).await
    }

    async fn apply_message_event(
        &self,
        event: &MessageStatusEvent,
        ownership: Option<&Ownership>,
    ) -> Result<LedgerWrite<MessageRecord>, SwitchboardError> {
        self.inner.apply_message_event(event, ownership).await
    }

    async fn list_messages(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, SwitchboardError> {
        self.inner.list_messages(tenant_id, limit).await
    }

    async fn list_conversations(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Conversation>, SwitchboardError> {
        self.inner.list_conversations(tenant_id).await
    }

    async fn list_conversation(
        &self,
        tenant_id: &TenantId,
        counterpart: &str,
    ) -> Result<Vec<MessageRecord>, SwitchboardError> {
        self.inner.list_conversation(tenant_id, counterpart).await
    }

    async fn mark_conversation_read(
        &self,
        tenant_id: &TenantId,
        counterpart: &str,
    ) -> Result<u64, SwitchboardError> {
        self.inner.mark_conversation_read(tenant_id, counterpart).await
    }

    async fn activity_stats(
        &self,
        tenant_id: &TenantId,
        since: &str,
    ) -> Result<ActivityStats, SwitchboardError> {
        self.inner.activity_stats(tenant_id, since).await
    }
}
