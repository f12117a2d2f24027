// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use switchboard_config::model::StorageConfig;
use switchboard_core::{
    ActivityStats, AdapterType, CallRecord, CallStatusEvent, Capability, Conversation,
    HealthStatus, LedgerWrite, MessageRecord, MessageStatusEvent, NewTenantNumber, NumberOwner,
    Ownership, PluginAdapter, StorageAdapter, SwitchboardError, TenantId, TenantNumber,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened by
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, SwitchboardError> {
        self.db.get().ok_or_else(|| SwitchboardError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), SwitchboardError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        if self.db.get().is_some() {
            self.checkpoint().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), SwitchboardError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| SwitchboardError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    // --- Registry ---

    async fn register_number(
        &self,
        number: NewTenantNumber,
    ) -> Result<TenantNumber, SwitchboardError> {
        queries::numbers::register_number(self.db()?, number).await
    }

    async fn release_number(
        &self,
        tenant_id: &TenantId,
        number: &str,
    ) -> Result<TenantNumber, SwitchboardError> {
        queries::numbers::release_number(self.db()?, tenant_id, number).await
    }

    async fn resolve_owner(&self, number: &str) -> Result<Option<NumberOwner>, SwitchboardError> {
        queries::numbers::resolve_owner(self.db()?, number).await
    }

    async fn list_numbers(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<TenantNumber>, SwitchboardError> {
        queries::numbers::list_numbers(self.db()?, tenant_id).await
    }

    async fn latest_capable_number(
        &self,
        tenant_id: &TenantId,
        capability: Capability,
    ) -> Result<Option<TenantNumber>, SwitchboardError> {
        queries::numbers::latest_capable_number(self.db()?, tenant_id, capability).await
    }

    // --- Ledger ---

    async fn apply_call_event(
        &self,
        event: &CallStatusEvent,
        ownership: Option<&Ownership>,
    ) -> Result<LedgerWrite<CallRecord>, SwitchboardError> {
        queries::calls::apply_call_event(self.db()?, event.clone(), ownership.cloned()).await
    }

    async fn get_call(&self, call_sid: &str) -> Result<Option<CallRecord>, SwitchboardError> {
        queries::calls::get_call(self.db()?, call_sid).await
    }

    async fn list_calls(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<CallRecord>, SwitchboardError> {
        queries::calls::list_calls(self.db()?, tenant_id, limit).await
    }

    async fn apply_message_event(
        &self,
        event: &MessageStatusEvent,
        ownership: Option<&Ownership>,
    ) -> Result<LedgerWrite<MessageRecord>, SwitchboardError> {
        queries::messages::apply_message_event(self.db()?, event.clone(), ownership.cloned()).await
    }

    async fn list_messages(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, SwitchboardError> {
        queries::messages::list_messages(self.db()?, tenant_id, limit).await
    }

    async fn list_conversations(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Conversation>, SwitchboardError> {
        queries::messages::list_conversations(self.db()?, tenant_id).await
    }

    async fn list_conversation(
        &self,
        tenant_id: &TenantId,
        counterpart: &str,
    ) -> Result<Vec<MessageRecord>, SwitchboardError> {
        queries::messages::list_conversation(self.db()?, tenant_id, counterpart).await
    }

    async fn mark_conversation_read(
        &self,
        tenant_id: &TenantId,
        counterpart: &str,
    ) -> Result<u64, SwitchboardError> {
        queries::messages::mark_conversation_read(self.db()?, tenant_id, counterpart).await
    }

    async fn activity_stats(
        &self,
        tenant_id: &TenantId,
        since: &str,
    ) -> Result<ActivityStats, SwitchboardError> {
        let db = self.db()?;
        Ok(ActivityStats {
            calls_since: queries::calls::count_since(db, tenant_id, since).await?,
            messages_since: queries::messages::count_since(db, tenant_id, since).await?,
            active_numbers: queries::numbers::count_active(db, tenant_id).await?,
        })
    }
}
