// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes decoded requests to a [`TransactionalStore`].

use std::sync::Arc;
use std::time::Duration;

use abdb_config::model::BridgeConfig;
use abdb_core::{AbdbError, TransactionalStore};
use serde_json::json;
use tracing::{debug, warn};

use crate::request::{Envelope, Request};
use crate::response::Response;

/// Decodes JSON request lines and runs them against the store.
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn TransactionalStore>,
    default_timeout: Duration,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn TransactionalStore>, config: &BridgeConfig) -> Self {
        Self {
            store,
            default_timeout: Duration::from_millis(config.default_timeout_ms),
        }
    }

    /// Handle one raw request line. Always produces a response.
    pub async fn handle_line(&self, line: &str) -> Response {
        let envelope: Envelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                return Response::failure(
                    serde_json::Value::Null,
                    &AbdbError::MalformedArgument(e.to_string()),
                );
            }
        };
        self.handle(envelope).await
    }

    /// Handle a parsed envelope, echoing its id.
    pub async fn handle(&self, envelope: Envelope) -> Response {
        let result = match Request::from_envelope(&envelope, self.default_timeout) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            debug!(action = %envelope.action, code = e.code(), "request failed");
        }
        Response::from_result(envelope.id, result)
    }

    /// Run a decoded request and shape its JSON result.
    pub async fn dispatch(&self, request: Request) -> Result<serde_json::Value, AbdbError> {
        let store = &self.store;
        match request {
            Request::TableNames {
                transaction_id,
                timeout,
            } => to_json(store.table_names(transaction_id, timeout).await?),
            Request::TableColumns {
                table,
                transaction_id,
                timeout,
            } => to_json(store.table_columns(&table, transaction_id, timeout).await?),
            Request::TransactionStart { timeout } => {
                let id = store.start_transaction(timeout).await?;
                Ok(json!({ "transaction_id": id }))
            }
            Request::TransactionFinish {
                transaction_id,
                commit,
                timeout,
            } => {
                store
                    .finish_transaction(transaction_id, commit, timeout)
                    .await?;
                Ok(serde_json::Value::Null)
            }
            Request::TransactionIsAutocommit => {
                let current = store.current_transaction().await?;
                Ok(json!({ "transaction_id": current }))
            }
            Request::QueryExecute {
                query,
                transaction_id,
                timeout,
            } => {
                store.execute(&query, transaction_id, timeout).await?;
                Ok(serde_json::Value::Null)
            }
            Request::QuerySelect {
                query,
                column_types,
                transaction_id,
                timeout,
            } => to_json(
                store
                    .select(&query, &column_types, transaction_id, timeout)
                    .await?,
            ),
        }
    }
}

fn to_json<T: serde::Serialize>(value: T) -> Result<serde_json::Value, AbdbError> {
    serde_json::to_value(value).map_err(|e| AbdbError::Internal(e.to_string()))
}
