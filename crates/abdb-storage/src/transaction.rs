// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transaction coordination: token issue, token validation, BEGIN/COMMIT/ROLLBACK.
//!
//! [`TransactionState`] is only ever touched from inside the lane, so its
//! methods take the raw `rusqlite::Connection` and run synchronously.

use abdb_core::{AbdbError, TransactionId};
use tracing::{info, warn};

/// The open transaction (if any) and the next token to issue.
///
/// Invariant: `current.is_some()` exactly when the engine is outside
/// autocommit because of a BEGIN issued by [`TransactionState::begin`].
#[derive(Debug)]
pub struct TransactionState {
    current: Option<TransactionId>,
    next: TransactionId,
}

impl Default for TransactionState {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionState {
    pub fn new() -> Self {
        Self {
            current: None,
            next: TransactionId(0),
        }
    }

    /// The open transaction's token.
    pub fn current(&self) -> Option<TransactionId> {
        self.current
    }

    /// The token the next successful `begin` will return.
    pub fn next_id(&self) -> TransactionId {
        self.next
    }

    /// Check a caller-supplied token against the open transaction.
    ///
    /// Valid only when both are absent, or both are present and equal.
    pub fn validate(&self, supplied: Option<TransactionId>) -> Result<(), AbdbError> {
        if self.current == supplied {
            Ok(())
        } else {
            Err(AbdbError::WrongTransactionId {
                current: self.current,
                supplied,
            })
        }
    }

    /// Issue BEGIN and hand out the next token.
    pub fn begin(&mut self, conn: &rusqlite::Connection) -> Result<TransactionId, AbdbError> {
        if let Some(current) = self.current {
            return Err(AbdbError::OtherTransactionAlreadyInProgress(current));
        }

        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| AbdbError::CannotBeginTransaction(e.to_string()))?;

        let id = self.next;
        self.current = Some(id);
        self.next = id.next();
        info!(transaction_id = %id, "transaction started");
        Ok(id)
    }

    /// Commit or roll back the open transaction identified by `supplied`.
    ///
    /// If COMMIT or ROLLBACK fails, the token is kept while the engine still
    /// reports an open transaction, so the caller can retry `finish`. If the
    /// engine already left the transaction (SQLite rolls back on some
    /// errors), the token is cleared to stay in agreement with it.
    pub fn finish(
        &mut self,
        conn: &rusqlite::Connection,
        supplied: TransactionId,
        commit: bool,
    ) -> Result<(), AbdbError> {
        if self.current.is_none() {
            return Err(AbdbError::NoTransactionInProgress);
        }
        self.validate(Some(supplied))?;

        let outcome = if commit {
            conn.execute_batch("COMMIT")
                .map_err(|e| AbdbError::CannotCommit(e.to_string()))
        } else {
            conn.execute_batch("ROLLBACK")
                .map_err(|e| AbdbError::CannotRollback(e.to_string()))
        };

        match outcome {
            Ok(()) => {
                self.current = None;
                info!(transaction_id = %supplied, commit, "transaction finished");
                Ok(())
            }
            Err(err) => {
                if conn.is_autocommit() {
                    warn!(
                        transaction_id = %supplied,
                        error = %err,
                        "engine ended the transaction despite the failure; clearing token"
                    );
                    self.current = None;
                } else {
                    warn!(transaction_id = %supplied, error = %err, "transaction still open");
                }
                Err(err)
            }
        }
    }

    /// Report the open transaction after checking it against the engine.
    ///
    /// Engine autocommit must coincide with "no token"; any contradiction is
    /// surfaced as [`AbdbError::TransactionIdInconsistency`] and left as is.
    pub fn check_autocommit(
        &self,
        conn: &rusqlite::Connection,
    ) -> Result<Option<TransactionId>, AbdbError> {
        let engine_autocommit = conn.is_autocommit();
        if engine_autocommit == self.current.is_none() {
            Ok(self.current)
        } else {
            warn!(
                current = ?self.current,
                engine_autocommit,
                "transaction state disagrees with engine"
            );
            Err(AbdbError::TransactionIdInconsistency {
                current: self.current,
                engine_autocommit,
            })
        }
    }
}
