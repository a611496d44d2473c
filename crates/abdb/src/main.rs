// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ABDB - a single-connection SQLite coordinator.
//!
//! This is the binary entry point: one-shot commands against the configured
//! database, plus `serve` for the newline-delimited JSON bridge.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;
use std::time::Duration;

use abdb_config::AbdbConfig;
use abdb_core::{AbdbError, ColumnType, TransactionalStore};
use abdb_storage::AbDatabase;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

/// ABDB - a single-connection SQLite coordinator.
#[derive(Parser, Debug)]
#[command(name = "abdb", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List user tables.
    Tables,
    /// Describe the columns of a table.
    Columns {
        table: String,
    },
    /// Execute one SQL statement, discarding any rows.
    Exec {
        sql: String,
    },
    /// Run a query and print its rows as JSON.
    Select {
        sql: String,
        /// Comma-separated column tags (Bool, Float, Int, Long, JSON, String).
        #[arg(long, value_delimiter = ',', value_parser = parse_column_type)]
        types: Vec<ColumnType>,
    },
    /// Serve JSON requests over stdin/stdout.
    Serve,
}

fn parse_column_type(raw: &str) -> Result<ColumnType, String> {
    ColumnType::from_name(raw.trim()).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => abdb_config::load_and_validate_path(path),
        None => abdb_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            abdb_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("abdb: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &AbdbConfig) -> Result<(), AbdbError> {
    let path = config.storage.resolve_database_path()?;
    let db = AbDatabase::open_at(&path, &config.storage).await?;

    let outcome = run_command(&db, command, config).await;

    if let Err(e) = db.close().await {
        warn!(error = %e, "database did not close cleanly");
    }
    outcome
}

async fn run_command(
    db: &AbDatabase,
    command: Commands,
    config: &AbdbConfig,
) -> Result<(), AbdbError> {
    let timeout = Duration::from_millis(config.bridge.default_timeout_ms);
    match command {
        Commands::Tables => print_json(&db.table_names(None, timeout).await?),
        Commands::Columns { table } => {
            print_json(&db.table_columns(&table, None, timeout).await?)
        }
        Commands::Exec { sql } => db.execute(&sql, None, timeout).await,
        Commands::Select { sql, types } => {
            print_json(&db.select(&sql, &types, None, timeout).await?)
        }
        Commands::Serve => {
            info!(database = %db.location(), "serving JSON bridge on stdin/stdout");
            serve::run_serve(db.clone(), &config.bridge).await
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), AbdbError> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| AbdbError::Internal(e.to_string()))?;
    println!("{text}");
    Ok(())
}

/// Logs go to stderr; stdout carries command output and bridge responses.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("abdb={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn select_types_split_on_commas() {
        let cli = Cli::try_parse_from(["abdb", "select", "SELECT 1, 2", "--types", "Long,json"])
            .unwrap();
        match cli.command {
            Commands::Select { sql, types } => {
                assert_eq!(sql, "SELECT 1, 2");
                assert_eq!(types, vec![ColumnType::Long, ColumnType::Json]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_select_type_is_rejected_by_the_parser() {
        let err = Cli::try_parse_from(["abdb", "select", "SELECT 1", "--types", "Decimal"])
            .unwrap_err();
        assert!(err.to_string().contains("Decimal"));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["abdb", "tables", "--config", "/tmp/abdb.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/abdb.toml")));
        assert!(matches!(cli.command, Commands::Tables));
    }
}
