// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The serialization lane every database operation passes through.
//!
//! `tokio-rusqlite` runs submitted closures one at a time, in submission
//! order, on the connection's background thread. The lane pairs that thread
//! with the [`TransactionState`], so token checks and the statements they
//! guard execute as one uninterrupted unit.
//!
//! Do NOT reach the connection by any route other than [`Lane::submit`].

use std::sync::{Arc, Mutex};

use abdb_core::AbdbError;
use tracing::debug;

use crate::connection::ConnectionHandle;
use crate::transaction::TransactionState;

/// Map a lane failure onto the error taxonomy.
///
/// A closed background thread means the handle was closed under a queued call.
pub(crate) fn map_lane_err(e: tokio_rusqlite::Error<AbdbError>) -> AbdbError {
    match e {
        tokio_rusqlite::Error::Error(e) => e,
        tokio_rusqlite::Error::ConnectionClosed => AbdbError::DatabaseNotOpened,
        other => AbdbError::Internal(other.to_string()),
    }
}

/// Single-admission access to the connection and transaction state.
pub struct Lane {
    handle: ConnectionHandle,
    // Only locked on the lane thread, so never contended.
    state: Arc<Mutex<TransactionState>>,
}

impl Lane {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            state: Arc::new(Mutex::new(TransactionState::new())),
        }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Queue `op` behind every previously submitted operation and await its result.
    ///
    /// Once queued, `op` runs to completion even if the returned future is
    /// dropped.
    pub async fn submit<F, R>(&self, name: &'static str, op: F) -> Result<R, AbdbError>
    where
        F: FnOnce(&mut rusqlite::Connection, &mut TransactionState) -> Result<R, AbdbError>
            + Send
            + 'static,
        R: Send + 'static,
    {
        let conn = self.handle.connection()?;
        let state = Arc::clone(&self.state);
        debug!(op = name, "queued");

        conn.call(move |conn| {
            let mut state = state
                .lock()
                .map_err(|_| AbdbError::Internal("transaction state lock poisoned".into()))?;
            op(conn, &mut state)
        })
        .await
        .map_err(map_lane_err)
    }

    /// Close the underlying handle after all queued work has drained.
    pub async fn close(&self) -> Result<(), AbdbError> {
        self.handle.close().await
    }
}
