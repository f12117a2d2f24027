// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use switchboard_bus::EventBus;
use switchboard_carrier::GrantIssuer;
use switchboard_config::SwitchboardConfig;
use switchboard_config::model::ServerConfig;
use switchboard_core::{CarrierClient, StorageAdapter, SwitchboardError};
use switchboard_markup::Renderer;
use switchboard_router::{Reconciler, RoutingEngine, paths};

use crate::auth::{SessionAuth, session_middleware};
use crate::handlers;
use crate::signature::{WebhookAuth, signature_middleware};
use crate::webhooks;
use crate::ws;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: RoutingEngine,
    pub storage: Arc<dyn StorageAdapter>,
    pub bus: EventBus,
    pub grants: GrantIssuer,
    pub renderer: Renderer,
    pub session: SessionAuth,
    pub webhook_auth: WebhookAuth,
    /// Budget for registry and ledger I/O inside a webhook.
    pub io_timeout: Duration,
    pub health: HealthState,
}

impl GatewayState {
    /// Wire the routing stack for `config` over the given collaborators.
    pub fn new(
        config: &SwitchboardConfig,
        storage: Arc<dyn StorageAdapter>,
        carrier: Arc<dyn CarrierClient>,
        bus: EventBus,
    ) -> Self {
        let reconciler = Reconciler::new(storage.clone(), bus.clone());
        let engine = RoutingEngine::new(
            storage.clone(),
            carrier,
            reconciler,
            config.routing.clone(),
            &config.server.public_base_url,
        );
        Self {
            engine,
            storage,
            bus,
            grants: GrantIssuer::new(&config.carrier, &config.grant),
            renderer: Renderer::new(config.routing.voice.clone()),
            session: SessionAuth::new(config.auth.session_secret.clone()),
            webhook_auth: WebhookAuth::new(
                config.carrier.validate_signatures,
                config.carrier.auth_token.clone(),
                &config.server.public_base_url,
            ),
            io_timeout: Duration::from_millis(config.server.io_timeout_ms),
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render: None,
            },
        }
    }

    /// Serve `/metrics` from the given renderer.
    pub fn with_metrics(mut self, render: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.health.prometheus_render = Some(render);
        self
    }
}

/// Build the complete application router.
///
/// - `/health`, `/metrics`: public
/// - `/webhooks/*`: carrier signature required
/// - `/v1/*`: session bearer token required
/// - `/v1/live`: session token in the query string
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state.clone());

    let webhook_routes = Router::new()
        .route(paths::VOICE, post(webhooks::voice))
        .route(paths::VOICE_STATUS, post(webhooks::voice_status))
        .route(paths::VOICE_DIAL_STATUS, post(webhooks::dial_status))
        .route(paths::VOICE_RECORDING, post(webhooks::recording))
        .route(paths::VOICE_BRIDGE, post(webhooks::bridge))
        .route(paths::SMS, post(webhooks::sms))
        .route(paths::SMS_STATUS, post(webhooks::sms_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.webhook_auth.clone(),
            signature_middleware,
        ))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/grants", post(handlers::post_grant))
        .route(
            "/v1/calls",
            post(handlers::post_call).get(handlers::list_calls),
        )
        .route(
            "/v1/messages",
            post(handlers::post_message).get(handlers::list_messages),
        )
        .route("/v1/conversations", get(handlers::list_conversations))
        .route(
            "/v1/conversations/{counterpart}",
            get(handlers::get_conversation),
        )
        .route(
            "/v1/conversations/{counterpart}/read",
            post(handlers::mark_conversation_read),
        )
        .route(
            "/v1/numbers",
            get(handlers::list_numbers).post(handlers::post_number),
        )
        .route("/v1/numbers/{number}", delete(handlers::release_number))
        .route("/v1/stats", get(handlers::get_stats))
        .route_layer(axum_middleware::from_fn_with_state(
            state.session.clone(),
            session_middleware,
        ))
        .with_state(state.clone());

    // Browsers cannot set headers on a WebSocket handshake.
    let ws_routes = Router::new()
        .route("/v1/live", get(ws::live_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .merge(api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), SwitchboardError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SwitchboardError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(%addr, public_base_url = %config.public_base_url, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| SwitchboardError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_state_is_clone() {
        let health = HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render: Some(Arc::new(|| "# metrics".to_string())),
        };
        let cloned = health.clone();
        let render = cloned.prometheus_render.unwrap();
        assert_eq!(render(), "# metrics");
    }
}
