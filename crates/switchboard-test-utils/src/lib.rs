// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Switchboard integration tests.
//!
//! - [`MockCarrier`] - carrier client that records requests in memory
//! - [`TestHarness`] - temp SQLite ledger, event bus and routing engine
//! - [`FaultyStorage`] - ledger wrapper that stalls or fails on demand

pub mod faulty_storage;
pub mod harness;
pub mod mock_carrier;

pub use faulty_storage::FaultyStorage;
pub use harness::{TestHarness, TestHarnessBuilder, voice_and_sms, voice_only};
pub use mock_carrier::MockCarrier;
