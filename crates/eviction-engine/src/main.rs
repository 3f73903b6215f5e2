//! Administrative binary for eviction pools.
//!
//! Wires configuration, logging, the `PostgreSQL` store, and the season
//! service together, runs one command, and prints its result as JSON on
//! stdout.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Load configuration from `eviction-config.yaml` (defaults if absent)
//! 3. Initialize structured logging (tracing) on stderr
//! 4. Connect to `PostgreSQL`
//! 5. Run the command and print its JSON output
//!
//! Refusals the operator must act on (unmet ceremony steps, constraint
//! violations, failing season checks) are also printed to stdout as
//! `{"rejected": ...}` before the process exits with an error.

mod cli;
mod commands;
mod error;
mod logging;

use std::path::Path;

use clap::Parser;
use eviction_core::{EngineConfig, SeasonService};
use eviction_db::{PgSeasonStore, PostgresPool};
use serde_json::{Value, json};
use tracing::info;

use crate::cli::{Cli, Command};
use crate::error::EngineError;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, the database, or the command fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.logging);
    info!(config = %cli.config.display(), "eviction-engine starting");

    let pool = PostgresPool::connect(&config.database)
        .await
        .map_err(EngineError::from)?;
    let store = PgSeasonStore::new(pool.clone());

    let outcome = match cli.command {
        Command::Migrate => migrate(&store).await,
        Command::Pool(command) => {
            let service = SeasonService::with_config(store, &config);
            commands::run(&service, command).await
        }
    };
    pool.close().await;

    match outcome {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            if let Some(detail) = err.rejection_detail() {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "rejected": detail }))?
                );
            }
            tracing::error!(error = %err, "Command failed");
            Err(err.into())
        }
    }
}

/// Load the configuration file, falling back to defaults (plus the
/// `DATABASE_URL` override) when the file does not exist.
fn load_config(path: &Path) -> Result<EngineConfig, EngineError> {
    if path.exists() {
        return Ok(EngineConfig::from_file(path)?);
    }
    let mut config = EngineConfig::default();
    config.database.apply_env_overrides();
    Ok(config)
}

/// Apply migrations and seed the default rule table.
async fn migrate(store: &PgSeasonStore) -> Result<Value, EngineError> {
    store.postgres().run_migrations().await?;
    let seeded = store.seed_default_rules().await?;
    info!(seeded, "Database ready");
    Ok(json!({ "migrated": true, "default_rules_seeded": seeded }))
}
