// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live ledger updates over WebSocket.
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "call.inserted", "record": {"callSid": "CA..", "status": "ringing", ...}}
//! {"type": "message.updated", "record": {"messageSid": "SM..", "status": "delivered", ...}}
//! ```
//!
//! Client frames other than close are ignored.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use switchboard_bus::TenantSubscription;
use switchboard_core::{SwitchboardError, TenantId};

use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// GET /v1/live?token=<session token>
///
/// The session token is checked before the upgrade; a bad token never
/// reaches the bus.
pub async fn live_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Query(query): Query<LiveQuery>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SwitchboardError::Unauthorized("missing session token".into()))?;
    let tenant_id = state.session.verify(&token)?;

    let subscription = state.bus.subscribe(tenant_id.clone());
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, tenant_id, subscription)))
}

async fn handle_socket(socket: WebSocket, tenant_id: TenantId, mut subscription: TenantSubscription) {
    let (mut sender, mut receiver) = socket.split();
    switchboard_prometheus::adjust_live_sessions(1.0);
    tracing::debug!(tenant_id = %tenant_id, "live session opened");

    loop {
        tokio::select! {
            update = subscription.next() => {
                let Some(update) = update else { break };
                let text = match update.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, kind = update.kind(), "live update not serializable");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    switchboard_prometheus::adjust_live_sessions(-1.0);
    tracing::debug!(tenant_id = %tenant_id, "live session closed");
}
