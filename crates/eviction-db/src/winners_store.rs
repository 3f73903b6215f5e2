//! Season completion records.
//!
//! A row in `season_winners` freezes its pool: every write path checks
//! [`ensure_open`] inside its transaction before touching anything.

use chrono::{DateTime, Utc};
use eviction_core::StoreError;
use eviction_types::{PoolId, WinnersRecord};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `season_winners` table.
pub struct WinnersStore<'a> {
    pool: &'a PgPool,
}

impl<'a> WinnersStore<'a> {
    /// Create a new winners store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The pool's winners record, if the season is complete.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Serialization`] if the stored record is malformed.
    pub async fn load(&self, pool_id: PoolId) -> Result<Option<WinnersRecord>, DbError> {
        let row = sqlx::query_as::<_, WinnersRow>(
            r"SELECT pool_id, completed_at, record
              FROM season_winners
              WHERE pool_id = $1",
        )
        .bind(pool_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(serde_json::from_value(row.record)?)),
            None => Ok(None),
        }
    }

    /// Store the winners record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with [`StoreError::SeasonFrozen`] if
    /// the pool already has one, or [`DbError::Postgres`] if the insert
    /// fails.
    pub async fn save(&self, record: &WinnersRecord) -> Result<(), DbError> {
        let payload = serde_json::to_value(record)?;

        let result = sqlx::query(
            r"INSERT INTO season_winners (pool_id, completed_at, record)
              VALUES ($1, $2, $3)
              ON CONFLICT (pool_id) DO NOTHING",
        )
        .bind(record.pool_id.into_inner())
        .bind(record.completed_at)
        .bind(&payload)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::SeasonFrozen {
                pool_id: record.pool_id,
            }
            .into());
        }

        tracing::info!(
            pool_id = %record.pool_id,
            winning_teams = record.winning_teams.len(),
            "Stored season winners"
        );
        Ok(())
    }
}

/// Fail with [`StoreError::SeasonFrozen`] when the pool's season is complete.
pub(crate) async fn ensure_open(conn: &mut PgConnection, pool_id: PoolId) -> Result<(), DbError> {
    let frozen: Option<(Uuid,)> =
        sqlx::query_as(r"SELECT pool_id FROM season_winners WHERE pool_id = $1")
            .bind(pool_id.into_inner())
            .fetch_optional(&mut *conn)
            .await?;

    if frozen.is_some() {
        return Err(StoreError::SeasonFrozen { pool_id }.into());
    }
    Ok(())
}

/// A row from the `season_winners` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WinnersRow {
    /// The completed pool.
    pub pool_id: Uuid,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
    /// The full [`WinnersRecord`] as JSON.
    pub record: serde_json::Value,
}
