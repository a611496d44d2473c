// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for ABDB.

use strum::IntoStaticStr;
use thiserror::Error;

use crate::types::TransactionId;

/// The error type returned by every ABDB operation.
///
/// Engine-facing variants carry the diagnostic text reported by SQLite so that
/// callers see the underlying failure verbatim.
#[derive(Debug, Clone, PartialEq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AbdbError {
    // --- Connection lifecycle ---
    /// The database file could not be opened or created.
    #[error("cannot open database at {path}: {message}")]
    CannotOpenDatabase { path: String, message: String },

    /// An operation was attempted without an open connection.
    #[error("database not opened")]
    DatabaseNotOpened,

    // --- Statement lifecycle ---
    /// SQLite rejected the SQL text during preparation.
    #[error("cannot prepare statement: {0}")]
    CannotPrepare(String),

    /// The prepared statement failed while stepping.
    #[error("cannot execute statement: {0}")]
    CannotExecute(String),

    /// The prepared statement could not be released cleanly.
    #[error("cannot finalize statement: {0}")]
    CannotFinalize(String),

    // --- Transaction lifecycle ---
    #[error("cannot begin transaction: {0}")]
    CannotBeginTransaction(String),

    #[error("cannot commit: {0}")]
    CannotCommit(String),

    #[error("cannot rollback: {0}")]
    CannotRollback(String),

    /// `finish` was called while no transaction is open.
    #[error("no transaction in progress")]
    NoTransactionInProgress,

    /// `start` was called while another transaction holds the connection.
    #[error("other transaction already in progress({0})")]
    OtherTransactionAlreadyInProgress(TransactionId),

    // --- Token policy ---
    /// The supplied transaction id does not match the open transaction.
    #[error(
        "wrong transaction id (current: {}, supplied: {})",
        display_id(.current),
        display_id(.supplied)
    )]
    WrongTransactionId {
        current: Option<TransactionId>,
        supplied: Option<TransactionId>,
    },

    /// The coordinator and the engine disagree about whether a transaction is open.
    #[error(
        "transaction id inconsistency (current: {}, engine autocommit: {engine_autocommit})",
        display_id(.current)
    )]
    TransactionIdInconsistency {
        current: Option<TransactionId>,
        engine_autocommit: bool,
    },

    // --- Caller input ---
    #[error("unknown column type: {0}")]
    UnknownColumnType(String),

    #[error("malformed argument: {0}")]
    MalformedArgument(String),

    /// Configuration errors (invalid TOML, unresolvable paths).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AbdbError {
    /// Stable snake_case identifier for this error, used on the wire.
    pub fn code(&self) -> &'static str {
        self.into()
    }

    /// Whether this error is a transaction token conflict that a deferred
    /// retry may resolve.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AbdbError::OtherTransactionAlreadyInProgress(_) | AbdbError::WrongTransactionId { .. }
        )
    }
}

fn display_id(id: &Option<TransactionId>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_transaction_message_includes_current_id() {
        let err = AbdbError::OtherTransactionAlreadyInProgress(TransactionId(0));
        assert_eq!(err.to_string(), "other transaction already in progress(0)");
    }

    #[test]
    fn wrong_transaction_id_renders_missing_ids_as_none() {
        let err = AbdbError::WrongTransactionId {
            current: Some(TransactionId(3)),
            supplied: None,
        };
        assert_eq!(
            err.to_string(),
            "wrong transaction id (current: 3, supplied: none)"
        );
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(AbdbError::DatabaseNotOpened.code(), "database_not_opened");
        assert_eq!(
            AbdbError::NoTransactionInProgress.code(),
            "no_transaction_in_progress"
        );
        assert_eq!(
            AbdbError::UnknownColumnType("x".into()).code(),
            "unknown_column_type"
        );
        assert_eq!(
            AbdbError::TransactionIdInconsistency {
                current: None,
                engine_autocommit: false,
            }
            .code(),
            "transaction_id_inconsistency"
        );
    }

    #[test]
    fn only_token_conflicts_are_retryable() {
        assert!(AbdbError::OtherTransactionAlreadyInProgress(TransactionId(1)).is_conflict());
        assert!(
            AbdbError::WrongTransactionId {
                current: None,
                supplied: Some(TransactionId(1)),
            }
            .is_conflict()
        );
        assert!(!AbdbError::NoTransactionInProgress.is_conflict());
        assert!(!AbdbError::CannotCommit("busy".into()).is_conflict());
        assert!(!AbdbError::DatabaseNotOpened.is_conflict());
    }
}
