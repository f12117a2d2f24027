// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring a temp SQLite ledger, the bus and the routing engine.

use std::sync::Arc;

use switchboard_bus::EventBus;
use switchboard_config::SwitchboardConfig;
use switchboard_core::{
    Capabilities, NewTenantNumber, PhoneNumber, StorageAdapter, SwitchboardError, TenantId,
    TenantNumber,
};
use switchboard_router::{Reconciler, RoutingEngine};
use switchboard_storage::SqliteStorage;

use crate::mock_carrier::MockCarrier;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    config: SwitchboardConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = SwitchboardConfig::default();
        config.server.public_base_url = "https://sb.example.com".to_string();
        config.carrier.account_sid = Some("ACtest".to_string());
        config.carrier.auth_token = Some("test-auth-token".to_string());
        config.auth.session_secret = Some("test-session-secret".to_string());
        Self { config }
    }

    /// Adjust the configuration before the harness is built.
    pub fn with_config(mut self, edit: impl FnOnce(&mut SwitchboardConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub async fn build(self) -> Result<TestHarness, SwitchboardError> {
        let temp_dir = tempfile::TempDir::new().map_err(SwitchboardError::storage)?;
        let mut config = self.config;
        config.storage.database_path = temp_dir
            .path()
            .join("switchboard-test.db")
            .to_string_lossy()
            .into_owned();

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let carrier = MockCarrier::new();
        let bus = EventBus::default();
        let reconciler = Reconciler::new(storage.clone(), bus.clone());
        let engine = RoutingEngine::new(
            storage.clone(),
            Arc::new(carrier.clone()),
            reconciler,
            config.routing.clone(),
            &config.server.public_base_url,
        );

        Ok(TestHarness {
            storage,
            carrier,
            bus,
            engine,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete routing stack over a throwaway database.
pub struct TestHarness {
    pub storage: Arc<dyn StorageAdapter>,
    pub carrier: MockCarrier,
    pub bus: EventBus,
    pub engine: RoutingEngine,
    pub config: SwitchboardConfig,
    /// Kept alive so the database outlives the harness.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Build with defaults.
    pub async fn new() -> Result<Self, SwitchboardError> {
        Self::builder().build().await
    }

    /// A routing engine sharing this harness's carrier, bus and config but
    /// reading and writing through `storage`.
    pub fn engine_over(&self, storage: Arc<dyn StorageAdapter>) -> RoutingEngine {
        let reconciler = Reconciler::new(storage.clone(), self.bus.clone());
        RoutingEngine::new(
            storage,
            Arc::new(self.carrier.clone()),
            reconciler,
            self.config.routing.clone(),
            &self.config.server.public_base_url,
        )
    }

    /// Register `number` for `tenant` with the given capabilities.
    pub async fn register_number(
        &self,
        tenant: &str,
        number: &str,
        capabilities: Capabilities,
    ) -> Result<TenantNumber, SwitchboardError> {
        self.storage
            .register_number(NewTenantNumber {
                number: PhoneNumber::parse(number)?,
                tenant_id: TenantId::parse(tenant)?,
                capabilities,
                carrier_sid: None,
                voice_url: None,
                sms_url: None,
            })
            .await
    }
}

/// Voice and SMS, no MMS.
pub fn voice_and_sms() -> Capabilities {
    Capabilities {
        voice: true,
        sms: true,
        mms: false,
    }
}

pub fn voice_only() -> Capabilities {
    Capabilities {
        voice: true,
        sms: false,
        mms: false,
    }
}
