//! Contestant roster and per-pool settings.

use std::collections::BTreeMap;

use eviction_types::{Contestant, ContestantId, PoolId, PoolSettings};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, to_i32, to_u32};
use crate::winners_store::ensure_open;

/// Operations on the `contestants` and `pool_settings` tables.
pub struct RosterStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RosterStore<'a> {
    /// Create a new roster store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or rename a contestant.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn upsert_contestant(&self, contestant: &Contestant) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO contestants (id, pool_id, name, is_active, final_placement)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (id) DO UPDATE
              SET name = EXCLUDED.name,
                  is_active = EXCLUDED.is_active,
                  final_placement = EXCLUDED.final_placement",
        )
        .bind(contestant.id.into_inner())
        .bind(contestant.pool_id.into_inner())
        .bind(&contestant.name)
        .bind(contestant.is_active)
        .bind(contestant.final_placement.map(to_i32))
        .execute(self.pool)
        .await?;

        tracing::debug!(
            contestant_id = %contestant.id,
            pool_id = %contestant.pool_id,
            "Upserted contestant"
        );
        Ok(())
    }

    /// The pool's roster in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::InvalidColumn`] for a negative placement.
    pub async fn list_contestants(&self, pool_id: PoolId) -> Result<Vec<Contestant>, DbError> {
        let rows = sqlx::query_as::<_, ContestantRow>(
            r"SELECT id, pool_id, name, is_active, final_placement
              FROM contestants
              WHERE pool_id = $1
              ORDER BY created_at, id",
        )
        .bind(pool_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Contestant::try_from).collect()
    }

    /// Replace every final placement in the pool.
    ///
    /// Contestants missing from `placements` are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] once the season is complete, or
    /// [`DbError::Postgres`] if an update fails. Nothing changes on error.
    pub async fn set_final_placements(
        &self,
        pool_id: PoolId,
        placements: &BTreeMap<ContestantId, u32>,
    ) -> Result<(), DbError> {
        let ids: Vec<Uuid> = placements.keys().copied().map(Uuid::from).collect();
        let ranks: Vec<i32> = placements.values().copied().map(to_i32).collect();

        let mut tx = self.pool.begin().await?;
        ensure_open(&mut tx, pool_id).await?;

        sqlx::query(r"UPDATE contestants SET final_placement = NULL WHERE pool_id = $1")
            .bind(pool_id.into_inner())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r"UPDATE contestants AS c
              SET final_placement = p.placement
              FROM UNNEST($2::uuid[], $3::int4[]) AS p(id, placement)
              WHERE c.id = p.id AND c.pool_id = $1",
        )
        .bind(pool_id.into_inner())
        .bind(&ids)
        .bind(&ranks)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            pool_id = %pool_id,
            placed = result.rows_affected(),
            "Stored final placements"
        );
        Ok(())
    }

    /// The pool's stored settings, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn load_settings(&self, pool_id: PoolId) -> Result<Option<PoolSettings>, DbError> {
        let row = sqlx::query_as::<_, PoolSettingsRow>(
            r"SELECT max_nominees, picks_per_team, enabled_special_events
              FROM pool_settings
              WHERE pool_id = $1",
        )
        .bind(pool_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(PoolSettings::try_from).transpose()
    }

    /// Insert or replace the pool's settings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn save_settings(
        &self,
        pool_id: PoolId,
        settings: &PoolSettings,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO pool_settings
                (pool_id, max_nominees, picks_per_team, enabled_special_events)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (pool_id) DO UPDATE
              SET max_nominees = EXCLUDED.max_nominees,
                  picks_per_team = EXCLUDED.picks_per_team,
                  enabled_special_events = EXCLUDED.enabled_special_events",
        )
        .bind(pool_id.into_inner())
        .bind(to_i32(settings.max_nominees))
        .bind(to_i32(settings.picks_per_team))
        .bind(&settings.enabled_special_events)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

/// A row from the `contestants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContestantRow {
    /// Contestant UUID.
    pub id: Uuid,
    /// Owning pool.
    pub pool_id: Uuid,
    /// Display name.
    pub name: String,
    /// Base roster flag.
    pub is_active: bool,
    /// Final placement, once assigned.
    pub final_placement: Option<i32>,
}

impl TryFrom<ContestantRow> for Contestant {
    type Error = DbError;

    fn try_from(row: ContestantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ContestantId(row.id),
            pool_id: PoolId(row.pool_id),
            name: row.name,
            is_active: row.is_active,
            final_placement: row
                .final_placement
                .map(|p| to_u32("final_placement", p))
                .transpose()?,
        })
    }
}

/// A row from the `pool_settings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PoolSettingsRow {
    /// Maximum nominees per cycle.
    pub max_nominees: i32,
    /// Contestants per team.
    pub picks_per_team: i32,
    /// Allowed special event types.
    pub enabled_special_events: Vec<String>,
}

impl TryFrom<PoolSettingsRow> for PoolSettings {
    type Error = DbError;

    fn try_from(row: PoolSettingsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            max_nominees: to_u32("max_nominees", row.max_nominees)?,
            picks_per_team: to_u32("picks_per_team", row.picks_per_team)?,
            enabled_special_events: row.enabled_special_events,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn contestant_row_converts() {
        let row = ContestantRow {
            id: Uuid::now_v7(),
            pool_id: Uuid::now_v7(),
            name: "Alice".to_owned(),
            is_active: true,
            final_placement: Some(1),
        };
        let contestant = Contestant::try_from(row.clone()).unwrap();
        assert_eq!(contestant.id.into_inner(), row.id);
        assert_eq!(contestant.final_placement, Some(1));
    }

    #[test]
    fn negative_settings_are_rejected() {
        let row = PoolSettingsRow {
            max_nominees: -2,
            picks_per_team: 2,
            enabled_special_events: Vec::new(),
        };
        assert!(matches!(
            PoolSettings::try_from(row),
            Err(DbError::InvalidColumn {
                column: "max_nominees",
                ..
            })
        ));
    }
}
