// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Switchboard control plane.
//!
//! Holds the identity & capability registry (`numbers`) and the event ledger
//! (`calls`, `messages`). WAL-mode SQLite with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`; every ledger upsert
//! runs as one IMMEDIATE transaction.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
