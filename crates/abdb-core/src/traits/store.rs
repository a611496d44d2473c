// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The operation surface consumed by dispatch layers.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AbdbError;
use crate::types::{ColumnInfo, ColumnType, Row, TransactionId};

/// A single-connection store with token-scoped transactions.
///
/// Every token-gated operation takes the caller's `transaction_id` (or `None`
/// for autocommit work) and a `timeout`. A zero timeout reports token
/// conflicts immediately; a non-zero timeout re-attempts the operation once
/// after that delay.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Names of all user tables.
    async fn table_names(
        &self,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    ) -> Result<Vec<String>, AbdbError>;

    /// Column metadata for one table.
    async fn table_columns(
        &self,
        table: &str,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    ) -> Result<Vec<ColumnInfo>, AbdbError>;

    /// Open a transaction and return its token.
    async fn start_transaction(&self, timeout: Duration) -> Result<TransactionId, AbdbError>;

    /// Commit (`commit = true`) or roll back the open transaction.
    async fn finish_transaction(
        &self,
        transaction_id: TransactionId,
        commit: bool,
        timeout: Duration,
    ) -> Result<(), AbdbError>;

    /// The open transaction, if any, after checking it against the engine.
    async fn current_transaction(&self) -> Result<Option<TransactionId>, AbdbError>;

    /// Run a statement that produces no rows.
    async fn execute(
        &self,
        sql: &str,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    ) -> Result<(), AbdbError>;

    /// Run a query and decode each row with the declared column types.
    async fn select(
        &self,
        sql: &str,
        column_types: &[ColumnType],
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    ) -> Result<Vec<Row>, AbdbError>;
}
