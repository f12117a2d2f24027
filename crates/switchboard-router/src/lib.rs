// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing decision engine and state reconciler.
//!
//! [`RoutingEngine`] turns signaling events and API requests into
//! [`CallAction`](switchboard_core::CallAction)s and ledger writes;
//! [`Reconciler`] applies carrier status callbacks and fans committed changes
//! out to live subscribers.

pub mod engine;
pub mod identity;
pub mod paths;
pub mod reconciler;

pub use engine::{DialLeg, InboundSms, OutboundCall, RoutingEngine, VoiceWebhook};
pub use identity::SignalingIdentity;
pub use reconciler::Reconciler;
