// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The coordinator callers talk to.
//!
//! [`AbDatabase`] owns exactly one connection (injected at construction) and
//! routes every operation through the lane: token validation first, then the
//! statement executor, all inside one queued closure.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use abdb_config::StorageConfig;
use abdb_core::{AbdbError, ColumnInfo, ColumnType, Row, TransactionId, TransactionalStore};
use async_trait::async_trait;

use crate::connection::ConnectionHandle;
use crate::executor;
use crate::queue::Lane;
use crate::retry::with_deferred_retry;

/// Single-connection SQLite coordinator with token-scoped transactions.
///
/// Cheap to clone; clones share the same lane and transaction state.
#[derive(Clone)]
pub struct AbDatabase {
    lane: Arc<Lane>,
}

impl AbDatabase {
    /// Wrap an already-open connection.
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            lane: Arc::new(Lane::new(handle)),
        }
    }

    /// Resolve the configured database path and open it.
    pub async fn open(config: &StorageConfig) -> Result<Self, AbdbError> {
        let path = config.resolve_database_path()?;
        Self::open_at(&path, config).await
    }

    /// Open the database file at an explicit path.
    pub async fn open_at(path: &Path, config: &StorageConfig) -> Result<Self, AbdbError> {
        Ok(Self::new(ConnectionHandle::open(path, config).await?))
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, AbdbError> {
        Ok(Self::new(ConnectionHandle::open_in_memory().await?))
    }

    pub fn is_open(&self) -> bool {
        self.lane.handle().is_open()
    }

    /// Path (or `:memory:`) of the underlying database.
    pub fn location(&self) -> &str {
        self.lane.handle().label()
    }

    /// Close the connection once queued work has drained. Idempotent.
    pub async fn close(&self) -> Result<(), AbdbError> {
        self.lane.close().await
    }
}

#[async_trait]
impl TransactionalStore for AbDatabase {
    async fn table_names(
        &self,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    ) -> Result<Vec<String>, AbdbError> {
        with_deferred_retry("table_names", timeout, || {
            self.lane.submit("table_names", move |conn, state| {
                state.validate(transaction_id)?;
                executor::table_names(conn)
            })
        })
        .await
    }

    async fn table_columns(
        &self,
        table: &str,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    ) -> Result<Vec<ColumnInfo>, AbdbError> {
        with_deferred_retry("table_columns", timeout, || {
            let table = table.to_owned();
            self.lane.submit("table_columns", move |conn, state| {
                state.validate(transaction_id)?;
                executor::table_columns(conn, &table)
            })
        })
        .await
    }

    async fn start_transaction(&self, timeout: Duration) -> Result<TransactionId, AbdbError> {
        with_deferred_retry("start_transaction", timeout, || {
            self.lane
                .submit("start_transaction", |conn, state| state.begin(conn))
        })
        .await
    }

    async fn finish_transaction(
        &self,
        transaction_id: TransactionId,
        commit: bool,
        timeout: Duration,
    ) -> Result<(), AbdbError> {
        with_deferred_retry("finish_transaction", timeout, || {
            self.lane.submit("finish_transaction", move |conn, state| {
                state.finish(conn, transaction_id, commit)
            })
        })
        .await
    }

    async fn current_transaction(&self) -> Result<Option<TransactionId>, AbdbError> {
        self.lane
            .submit("current_transaction", |conn, state| {
                state.check_autocommit(conn)
            })
            .await
    }

    async fn execute(
        &self,
        sql: &str,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    ) -> Result<(), AbdbError> {
        with_deferred_retry("execute", timeout, || {
            let sql = sql.to_owned();
            self.lane.submit("execute", move |conn, state| {
                state.validate(transaction_id)?;
                executor::execute(conn, &sql)
            })
        })
        .await
    }

    async fn select(
        &self,
        sql: &str,
        column_types: &[ColumnType],
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    ) -> Result<Vec<Row>, AbdbError> {
        with_deferred_retry("select", timeout, || {
            let sql = sql.to_owned();
            let column_types = column_types.to_vec();
            self.lane.submit("select", move |conn, state| {
                state.validate(transaction_id)?;
                executor::select(conn, &sql, &column_types)
            })
        })
        .await
    }
}
