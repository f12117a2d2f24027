// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait: the number registry and the call/message ledger.

use async_trait::async_trait;

use crate::error::SwitchboardError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ActivityStats, CallRecord, CallStatusEvent, Capability, Conversation, LedgerWrite,
    MessageRecord, MessageStatusEvent, NewTenantNumber, NumberOwner, Ownership, TenantId,
    TenantNumber,
};

/// Adapter for the persistence backend.
///
/// Every read is tenant-scoped except the registry lookups
/// ([`resolve_owner`](Self::resolve_owner), [`get_call`](Self::get_call)) that
/// carrier webhooks use to discover the tenant in the first place.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), SwitchboardError>;

    // --- Identity & capability registry ---

    /// Record an acquired number for a tenant.
    ///
    /// A released number is reactivated; a number active under another tenant
    /// yields `CapabilityDenied`. A number the tenant already holds keeps its
    /// capabilities and only takes the new carrier SID and callback URLs.
    async fn register_number(
        &self,
        number: NewTenantNumber,
    ) -> Result<TenantNumber, SwitchboardError>;

    /// Soft-release a number owned by `tenant_id`.
    async fn release_number(
        &self,
        tenant_id: &TenantId,
        number: &str,
    ) -> Result<TenantNumber, SwitchboardError>;

    /// Look up the active owner of a number. `None` for unregistered numbers.
    async fn resolve_owner(&self, number: &str) -> Result<Option<NumberOwner>, SwitchboardError>;

    async fn list_numbers(&self, tenant_id: &TenantId)
    -> Result<Vec<TenantNumber>, SwitchboardError>;

    /// The tenant's most recently acquired active number with `capability`.
    async fn latest_capable_number(
        &self,
        tenant_id: &TenantId,
        capability: Capability,
    ) -> Result<Option<TenantNumber>, SwitchboardError>;

    // --- Event ledger ---

    /// Atomically upsert a call record from a status event.
    ///
    /// `ownership` is used only when the record does not exist yet; without
    /// it an absent record yields `NotFound`.
    async fn apply_call_event(
        &self,
        event: &CallStatusEvent,
        ownership: Option<&Ownership>,
    ) -> Result<LedgerWrite<CallRecord>, SwitchboardError>;

    async fn get_call(&self, call_sid: &str) -> Result<Option<CallRecord>, SwitchboardError>;

    /// Most recent calls first.
    async fn list_calls(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<CallRecord>, SwitchboardError>;

    /// Atomically upsert a message record from a status event.
    async fn apply_message_event(
        &self,
        event: &MessageStatusEvent,
        ownership: Option<&Ownership>,
    ) -> Result<LedgerWrite<MessageRecord>, SwitchboardError>;

    /// Most recent messages first.
    async fn list_messages(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, SwitchboardError>;

    /// Conversations ordered by latest activity.
    async fn list_conversations(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Conversation>, SwitchboardError>;

    /// Messages exchanged with `counterpart`, oldest first.
    async fn list_conversation(
        &self,
        tenant_id: &TenantId,
        counterpart: &str,
    ) -> Result<Vec<MessageRecord>, SwitchboardError>;

    /// Mark inbound messages from `counterpart` read. Returns the number updated.
    async fn mark_conversation_read(
        &self,
        tenant_id: &TenantId,
        counterpart: &str,
    ) -> Result<u64, SwitchboardError>;

    /// Calls and messages created at or after `since` (ISO 8601), plus active numbers.
    async fn activity_stats(
        &self,
        tenant_id: &TenantId,
        since: &str,
    ) -> Result<ActivityStats, SwitchboardError>;
}
