// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard serve` command implementation.
//!
//! Opens the SQLite ledger, connects the carrier client, installs the
//! Prometheus recorder when enabled and serves the gateway until a shutdown
//! signal arrives.

use std::sync::Arc;

use switchboard_bus::EventBus;
use switchboard_carrier::TwilioClient;
use switchboard_config::SwitchboardConfig;
use switchboard_core::{PluginAdapter, StorageAdapter, SwitchboardError};
use switchboard_gateway::{GatewayState, start_server};
use switchboard_prometheus::PrometheusAdapter;
use switchboard_storage::SqliteStorage;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `switchboard serve` command.
pub async fn run_serve(config: SwitchboardConfig) -> Result<(), SwitchboardError> {
    init_tracing(&config.log.level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting switchboard serve");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
    info!(path = %config.storage.database_path, "ledger opened");

    let carrier = TwilioClient::new(&config.carrier)?;
    let bus = EventBus::default();

    let mut state = GatewayState::new(&config, storage.clone(), Arc::new(carrier), bus);

    if config.prometheus.enabled {
        let prometheus = Arc::new(PrometheusAdapter::new()?);
        state = state.with_metrics(Arc::new(move || prometheus.render()));
    } else {
        info!("prometheus metrics disabled");
    }

    if !state.grants.is_configured() {
        warn!("grant credentials incomplete; POST /v1/grants will fail until grant.api_key_sid and grant.api_key_secret are set");
    }
    if !config.carrier.validate_signatures {
        warn!("carrier webhook signature validation is disabled");
    }

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&config.server, state, cancel).await;

    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "ledger checkpoint on shutdown failed");
    }
    served?;

    info!("switchboard serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("switchboard={log_level},tower_http=warn,warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
