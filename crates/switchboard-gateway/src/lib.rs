// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for Switchboard.
//!
//! Serves the carrier webhooks that drive call routing and the ledger, and
//! the tenant-facing JSON API for grants, outbound calls, messages and
//! history. Live ledger changes are pushed over `/v1/live`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod signature;
pub mod webhooks;
pub mod ws;

pub use auth::{SessionAuth, SessionClaims};
pub use error::ApiError;
pub use server::{GatewayState, HealthState, build_router, start_server};
pub use signature::WebhookAuth;
