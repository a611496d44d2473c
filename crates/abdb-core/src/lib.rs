// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for ABDB.
//!
//! Provides the error taxonomy, the value and column types exchanged with
//! callers, and the [`TransactionalStore`] trait implemented by the SQLite
//! coordinator in `abdb-storage`.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AbdbError;
pub use traits::TransactionalStore;
pub use types::{ColumnInfo, ColumnType, Row, TransactionId, Value, timeout_from_millis};
