// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchboard telephony control plane.
//!
//! This crate provides the domain types, the status lattice, call actions,
//! error types and adapter traits used throughout the workspace.

pub mod action;
pub mod error;
pub mod lattice;
pub mod traits;
pub mod types;

pub use action::{CallAction, PstnDial};
pub use error::SwitchboardError;
pub use lattice::{Merge, merge_call, merge_message};
pub use types::{
    ActivityStats, AdapterType, ApplyOutcome, CallRecord, CallStatus, CallStatusEvent,
    Capabilities, Capability, Conversation, Direction, HealthStatus, IgnoreReason, LedgerWrite,
    MessageRecord, MessageStatus, MessageStatusEvent, NewTenantNumber, NumberOwner, NumberStatus,
    Ownership, PhoneNumber, TenantId, TenantNumber,
};

pub use traits::{
    CarrierClient, PlaceCallRequest, PlacedCall, PluginAdapter, SendMessageRequest, SentMessage,
    StorageAdapter,
};
