// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ownership of the single SQLite handle: open, PRAGMA setup, close.
//!
//! The handle itself has no concurrency logic. `tokio-rusqlite` runs every
//! closure submitted through it on one background thread, which is what
//! [`crate::queue::Lane`] builds on.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use abdb_config::StorageConfig;
use abdb_core::AbdbError;
use tracing::{debug, info, warn};

/// Exclusive owner of one `tokio_rusqlite::Connection`.
///
/// `None` means closed: either never opened successfully or already released.
pub struct ConnectionHandle {
    inner: Mutex<Option<tokio_rusqlite::Connection>>,
    label: String,
}

impl ConnectionHandle {
    /// Open (or create) the database file at `path` and apply PRAGMAs.
    ///
    /// On any failure the connection is released again, so a handle is never
    /// returned half-initialized.
    pub async fn open(path: &Path, config: &StorageConfig) -> Result<Self, AbdbError> {
        let label = path.display().to_string();
        let cannot_open = |message: String| AbdbError::CannotOpenDatabase {
            path: label.clone(),
            message,
        };

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| cannot_open(e.to_string()))?;

        let wal_mode = config.wal_mode;
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let setup = conn
            .call(move |conn| apply_pragmas(conn, wal_mode, busy_timeout))
            .await;

        if let Err(e) = setup {
            let message = e.to_string();
            if let Err(close_err) = conn.close().await {
                warn!(path = %label, error = %close_err, "close after failed setup also failed");
            }
            return Err(cannot_open(message));
        }

        info!(path = %label, wal_mode, "database opened");
        Ok(Self::from_connection(conn, label))
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, AbdbError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| AbdbError::CannotOpenDatabase {
                path: ":memory:".into(),
                message: e.to_string(),
            })?;
        debug!("in-memory database opened");
        Ok(Self::from_connection(conn, ":memory:".into()))
    }

    fn from_connection(conn: tokio_rusqlite::Connection, label: String) -> Self {
        Self {
            inner: Mutex::new(Some(conn)),
            label,
        }
    }

    /// Path (or `:memory:`) this handle was opened on.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().map(|c| c.is_some()).unwrap_or(false)
    }

    /// A sender onto the connection's background thread.
    ///
    /// Fails with [`AbdbError::DatabaseNotOpened`] once the handle is closed.
    pub(crate) fn connection(&self) -> Result<tokio_rusqlite::Connection, AbdbError> {
        self.inner
            .lock()
            .map_err(|_| AbdbError::Internal("connection handle lock poisoned".into()))?
            .clone()
            .ok_or(AbdbError::DatabaseNotOpened)
    }

    /// Release the native handle. Closing an already-closed handle is a no-op.
    ///
    /// Work already queued on the background thread finishes before the
    /// handle is released.
    pub async fn close(&self) -> Result<(), AbdbError> {
        let conn = self
            .inner
            .lock()
            .map_err(|_| AbdbError::Internal("connection handle lock poisoned".into()))?
            .take();

        let Some(conn) = conn else {
            debug!(path = %self.label, "close on already-closed handle");
            return Ok(());
        };

        conn.close()
            .await
            .map_err(|e| AbdbError::Internal(format!("closing {}: {e}", self.label)))?;
        info!(path = %self.label, "database closed");
        Ok(())
    }
}

fn apply_pragmas(
    conn: &mut rusqlite::Connection,
    wal_mode: bool,
    busy_timeout: Duration,
) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    if wal_mode {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    Ok(())
}
