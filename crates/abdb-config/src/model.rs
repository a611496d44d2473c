// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for ABDB.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a misspelled key is
//! reported at startup instead of being silently ignored.

use std::path::PathBuf;

use abdb_core::AbdbError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name of the database inside the per-application data directory.
pub const DATABASE_FILE_NAME: &str = "ab-database.sqlite";

/// Directory (under the platform data dir) that holds the database file.
pub const APP_DIR_NAME: &str = "abdb";

/// Top-level ABDB configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AbdbConfig {
    /// Database file and connection settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// JSON bridge settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Explicit database path. `None` uses `<data_dir>/abdb/ab-database.sqlite`.
    #[serde(default)]
    pub database_path: Option<String>,

    /// Enable WAL (Write-Ahead Logging) journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long SQLite waits on a locked file before reporting busy.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StorageConfig {
    /// Resolve the database file path and make sure its directory exists.
    ///
    /// Failing to resolve the path is the one condition the binary treats as
    /// fatal.
    pub fn resolve_database_path(&self) -> Result<PathBuf, AbdbError> {
        let path = match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME).join(DATABASE_FILE_NAME))
                .ok_or_else(|| {
                    AbdbError::Config("cannot resolve the application data directory".into())
                })?,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AbdbError::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        debug!(path = %path.display(), "resolved database path");
        Ok(path)
    }
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// JSON bridge configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Retry delay applied when a request carries no `timeout` argument.
    #[serde(default)]
    pub default_timeout_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_path_unset() {
        let config = AbdbConfig::default();
        assert!(config.storage.database_path.is_none());
        assert!(config.storage.wal_mode);
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.bridge.default_timeout_ms, 0);
    }

    #[test]
    fn explicit_path_is_used_and_parent_created() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("db.sqlite");
        let storage = StorageConfig {
            database_path: Some(target.to_str().unwrap().to_string()),
            ..StorageConfig::default()
        };

        let resolved = storage.resolve_database_path().unwrap();
        assert_eq!(resolved, target);
        assert!(dir.path().join("nested").is_dir());
    }
}
