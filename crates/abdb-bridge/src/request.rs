// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding of JSON request envelopes into typed requests.
//!
//! Wire shape: `{"id": <any>, "action": "<name>", "args": {...}}`. Missing or
//! ill-typed arguments are reported as [`AbdbError::MalformedArgument`];
//! unrecognized column tags as [`AbdbError::UnknownColumnType`].

use std::time::Duration;

use abdb_core::{AbdbError, ColumnType, TransactionId, timeout_from_millis};
use serde::Deserialize;

/// Raw envelope as it arrives on the wire.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Opaque correlation id echoed back in the response.
    #[serde(default)]
    pub id: serde_json::Value,
    pub action: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    table: Option<String>,
    transaction_id: Option<u64>,
    /// Milliseconds; zero or negative disables the deferred retry.
    timeout: Option<i64>,
    commit: Option<bool>,
    query: Option<String>,
    column_types: Option<Vec<serde_json::Value>>,
}

/// A decoded operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    TableNames {
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    },
    TableColumns {
        table: String,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    },
    TransactionStart {
        timeout: Duration,
    },
    TransactionFinish {
        transaction_id: TransactionId,
        commit: bool,
        timeout: Duration,
    },
    TransactionIsAutocommit,
    QueryExecute {
        query: String,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    },
    QuerySelect {
        query: String,
        column_types: Vec<ColumnType>,
        transaction_id: Option<TransactionId>,
        timeout: Duration,
    },
}

impl Request {
    /// Decode `envelope`, using `default_timeout` where no `timeout` is given.
    pub fn from_envelope(
        envelope: &Envelope,
        default_timeout: Duration,
    ) -> Result<Self, AbdbError> {
        let args: Args = match &envelope.args {
            serde_json::Value::Null => Args::default(),
            value => serde_json::from_value(value.clone())
                .map_err(|e| AbdbError::MalformedArgument(e.to_string()))?,
        };

        let timeout = match args.timeout {
            Some(ms) => timeout_from_millis(ms),
            None => default_timeout,
        };
        let transaction_id = args.transaction_id.map(TransactionId);

        let request = match envelope.action.as_str() {
            "table_names" => Request::TableNames {
                transaction_id,
                timeout,
            },
            "table_columns" => Request::TableColumns {
                table: required(args.table, "table")?,
                transaction_id,
                timeout,
            },
            "transaction_start" => Request::TransactionStart { timeout },
            "transaction_finish" => Request::TransactionFinish {
                transaction_id: required(transaction_id, "transaction_id")?,
                commit: required(args.commit, "commit")?,
                timeout,
            },
            "transaction_is_autocommit" => Request::TransactionIsAutocommit,
            "query_execute" => Request::QueryExecute {
                query: required(args.query, "query")?,
                transaction_id,
                timeout,
            },
            "query_select" => Request::QuerySelect {
                query: required(args.query, "query")?,
                column_types: required(args.column_types, "column_types")?
                    .iter()
                    .map(column_type)
                    .collect::<Result<_, _>>()?,
                transaction_id,
                timeout,
            },
            other => {
                return Err(AbdbError::MalformedArgument(format!(
                    "unknown action `{other}`"
                )));
            }
        };
        Ok(request)
    }
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, AbdbError> {
    value.ok_or_else(|| AbdbError::MalformedArgument(format!("missing argument `{name}`")))
}

/// A column tag given either by name (`"Long"`) or by index (`3`).
fn column_type(value: &serde_json::Value) -> Result<ColumnType, AbdbError> {
    match value {
        serde_json::Value::String(name) => ColumnType::from_name(name),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(index) => ColumnType::from_index(index),
            None => Err(AbdbError::UnknownColumnType(n.to_string())),
        },
        other => Err(AbdbError::UnknownColumnType(other.to_string())),
    }
}
