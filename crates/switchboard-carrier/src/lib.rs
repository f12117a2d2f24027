// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier integration for Switchboard.
//!
//! - [`TwilioClient`] places calls and sends messages over the REST API.
//! - [`signature`] validates webhook signatures.
//! - [`GrantIssuer`] signs short-lived voice grants for browser clients.

pub mod client;
pub mod grant;
pub mod signature;

pub use client::TwilioClient;
pub use grant::{Grant, GrantIssuer};
pub use signature::{SIGNATURE_HEADER, compute_signature, verify_signature};
