// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response envelopes written back to the caller.
//!
//! Success:
//! ```json
//! {"id": 7, "ok": true, "result": {"transaction_id": 0}}
//! ```
//!
//! Failure:
//! ```json
//! {"id": 7, "ok": false, "error": {"code": "no_transaction_in_progress", "message": "..."}}
//! ```

use abdb_core::AbdbError;
use serde::Serialize;

/// Error payload: stable code plus the human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl From<&AbdbError> for ErrorBody {
    fn from(err: &AbdbError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: serde_json::Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: serde_json::Value, err: &AbdbError) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorBody::from(err)),
        }
    }

    pub fn from_result(id: serde_json::Value, result: Result<serde_json::Value, AbdbError>) -> Self {
        match result {
            Ok(value) => Self::success(id, value),
            Err(err) => Self::failure(id, &err),
        }
    }

    /// Serialize to a single line of JSON.
    pub fn to_line(&self) -> String {
        // Every field is plain JSON data, so serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"id":null,"ok":false,"error":{{"code":"internal","message":"{e}"}}}}"#)
        })
    }
}
