// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for ABDB.
//!
//! TOML files layered with Figment, strict key checking, environment overrides,
//! and miette-rendered diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use abdb_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! let path = config.storage.resolve_database_path().expect("storage path");
//! println!("database: {}", path.display());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AbdbConfig, BridgeConfig, LogConfig, StorageConfig};

/// Load configuration from the file hierarchy and validate it.
pub fn load_and_validate() -> Result<AbdbConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Load configuration from one explicit file and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<AbdbConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

/// Load configuration from an inline TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<AbdbConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

#[allow(clippy::result_large_err)]
fn finish(loaded: Result<AbdbConfig, figment::Error>) -> Result<AbdbConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}
