// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-connection SQLite coordinator for ABDB.
//!
//! All access goes through one `tokio-rusqlite` background thread (the lane).
//! Transactions are identified by ascending tokens; every operation is
//! checked against the open transaction before it touches the connection,
//! and token conflicts can be retried once after a caller-supplied delay.

pub mod connection;
pub mod database;
pub mod executor;
pub mod queue;
pub mod retry;
pub mod transaction;

pub use connection::ConnectionHandle;
pub use database::AbDatabase;
pub use retry::with_deferred_retry;
pub use transaction::TransactionState;
