// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the coordinator, the bridge, and the CLI.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AbdbError;

/// Token identifying one open transaction.
///
/// Issued in strictly increasing order for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// The token issued after this one.
    pub fn next(self) -> Self {
        TransactionId(self.0 + 1)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert a caller-supplied millisecond retry budget.
///
/// Zero or negative budgets mean "report conflicts immediately".
pub fn timeout_from_millis(timeout_ms: i64) -> Duration {
    u64::try_from(timeout_ms)
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
}

/// Caller-declared decoding for one result column.
///
/// Tags are addressable by name (case-insensitive) or by their position in
/// this list (`Bool` = 0 through `String` = 5).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum ColumnType {
    Bool,
    Float,
    Int,
    Long,
    #[strum(serialize = "JSON")]
    #[serde(rename = "JSON")]
    Json,
    String,
}

impl ColumnType {
    pub const ALL: [ColumnType; 6] = [
        ColumnType::Bool,
        ColumnType::Float,
        ColumnType::Int,
        ColumnType::Long,
        ColumnType::Json,
        ColumnType::String,
    ];

    /// Resolve a tag from its numeric index.
    pub fn from_index(index: i64) -> Result<Self, AbdbError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| AbdbError::UnknownColumnType(index.to_string()))
    }

    /// Resolve a tag from its name.
    pub fn from_name(name: &str) -> Result<Self, AbdbError> {
        ColumnType::from_str(name).map_err(|_| AbdbError::UnknownColumnType(name.to_string()))
    }
}

/// A decoded cell.
///
/// `Null` is distinct from every decoded value, including `String("")` and
/// zero. Serializes untagged, so `Null` becomes JSON `null`. Non-finite
/// floats serialize as the strings `"Infinity"`, `"-Infinity"` and `"NaN"`
/// since JSON has no number for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Float(#[serde(serialize_with = "serialize_float")] f64),
    Int(i32),
    Long(i64),
    Json(serde_json::Map<String, serde_json::Value>),
    String(String),
}

fn serialize_float<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_sign_positive() {
        serializer.serialize_str("Infinity")
    } else {
        serializer.serialize_str("-Infinity")
    }
}

/// One materialized result row.
pub type Row = Vec<Value>;

/// Column metadata reported by table introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type as written in the table definition (may be empty).
    #[serde(rename = "type")]
    pub declared_type: String,
    pub not_null: bool,
}
