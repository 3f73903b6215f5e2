//! [`SeasonStore`] backed by `PostgreSQL`.

use std::collections::BTreeMap;

use eviction_core::{SeasonStore, StoreError, WeekWrite};
use eviction_scoring::defaults::default_rules;
use eviction_types::{
    BonusQuestion, Contestant, ContestantId, PoolId, PoolSettings, ScoringRule, SpecialEvent, Team,
    WeekEventRecord, WinnersRecord,
};
use sqlx::PgPool;

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::roster_store::RosterStore;
use crate::rule_store::RuleStore;
use crate::special_event_store::SpecialEventStore;
use crate::team_store::TeamStore;
use crate::week_store::WeekStore;
use crate::winners_store::WinnersStore;

/// The lifecycle manager's storage, one table-level store per concern.
#[derive(Clone)]
pub struct PgSeasonStore {
    pool: PostgresPool,
}

impl PgSeasonStore {
    /// Wrap a connected pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// Insert the built-in default rules that are not stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn seed_default_rules(&self) -> Result<u64, DbError> {
        RuleStore::new(self.pg()).seed_defaults(&default_rules()).await
    }

    /// Return the underlying connection pool handle.
    pub const fn postgres(&self) -> &PostgresPool {
        &self.pool
    }

    const fn pg(&self) -> &PgPool {
        self.pool.pool()
    }
}

impl SeasonStore for PgSeasonStore {
    async fn load_contestants(&self, pool_id: PoolId) -> Result<Vec<Contestant>, StoreError> {
        Ok(RosterStore::new(self.pg()).list_contestants(pool_id).await?)
    }

    async fn load_scoring_rules(&self, pool_id: PoolId) -> Result<Vec<ScoringRule>, StoreError> {
        Ok(RuleStore::new(self.pg()).list_for_pool(pool_id).await?)
    }

    async fn load_weeks(&self, pool_id: PoolId) -> Result<Vec<WeekEventRecord>, StoreError> {
        Ok(WeekStore::new(self.pg()).list_for_pool(pool_id).await?)
    }

    async fn load_week(
        &self,
        pool_id: PoolId,
        week: u32,
    ) -> Result<Option<WeekEventRecord>, StoreError> {
        Ok(WeekStore::new(self.pg()).get(pool_id, week).await?)
    }

    async fn load_special_events(&self, pool_id: PoolId) -> Result<Vec<SpecialEvent>, StoreError> {
        Ok(SpecialEventStore::new(self.pg())
            .list_for_pool(pool_id)
            .await?)
    }

    async fn load_pool_settings(
        &self,
        pool_id: PoolId,
    ) -> Result<Option<PoolSettings>, StoreError> {
        Ok(RosterStore::new(self.pg()).load_settings(pool_id).await?)
    }

    async fn load_teams(&self, pool_id: PoolId) -> Result<Vec<Team>, StoreError> {
        Ok(TeamStore::new(self.pg()).list_teams(pool_id).await?)
    }

    async fn load_bonus_questions(
        &self,
        pool_id: PoolId,
    ) -> Result<Vec<BonusQuestion>, StoreError> {
        Ok(TeamStore::new(self.pg())
            .list_bonus_questions(pool_id)
            .await?)
    }

    async fn write_week(&self, write: WeekWrite) -> Result<WeekEventRecord, StoreError> {
        Ok(WeekStore::new(self.pg()).write(write).await?)
    }

    async fn delete_week(&self, pool_id: PoolId, week: u32) -> Result<bool, StoreError> {
        Ok(WeekStore::new(self.pg()).delete(pool_id, week).await?)
    }

    async fn set_final_placements(
        &self,
        pool_id: PoolId,
        placements: &BTreeMap<ContestantId, u32>,
    ) -> Result<(), StoreError> {
        Ok(RosterStore::new(self.pg())
            .set_final_placements(pool_id, placements)
            .await?)
    }

    async fn load_winners(&self, pool_id: PoolId) -> Result<Option<WinnersRecord>, StoreError> {
        Ok(WinnersStore::new(self.pg()).load(pool_id).await?)
    }

    async fn save_winners(&self, record: &WinnersRecord) -> Result<(), StoreError> {
        Ok(WinnersStore::new(self.pg()).save(record).await?)
    }
}
