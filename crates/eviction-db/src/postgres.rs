//! The engine's `PostgreSQL` pool.
//!
//! Rows here are the system of record for every pool. Points and standings
//! are recomputed from them on each read and never written back.

use std::time::Duration;

use eviction_core::config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::DbError;

/// Idle connections are released after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(IDLE_TIMEOUT)
}

/// Connection pool over the engine schema.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Open a pool sized and timed by the `database` config section.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL does not parse, or
    /// [`DbError::Postgres`] if no connection can be made.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let options: PgConnectOptions = config
            .url
            .parse()
            .map_err(|e: sqlx::Error| DbError::Config(format!("invalid database url: {e}")))?;
        let pool = pool_options(config).connect_with(options).await?;
        tracing::info!(
            max_connections = config.max_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    /// Apply the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Schema is current");
        Ok(())
    }

    /// The underlying [`PgPool`].
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Drain and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_section_sizes_the_pool() {
        let section = DatabaseConfig {
            url: "postgresql://pool:pool@db:5432/pool".to_owned(),
            max_connections: 4,
            connect_timeout_secs: 9,
        };
        let options = pool_options(&section);
        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(9));
        assert_eq!(options.get_idle_timeout(), Some(IDLE_TIMEOUT));
    }

    #[tokio::test]
    async fn malformed_url_is_a_config_error() {
        let section = DatabaseConfig {
            url: "not a connection string".to_owned(),
            ..DatabaseConfig::default()
        };
        let err = PostgresPool::connect(&section).await.err();
        assert!(matches!(err, Some(DbError::Config(_))));
    }
}
