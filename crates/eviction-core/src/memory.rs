//! In-memory [`SeasonStore`] for tests and local tooling.
//!
//! Holds every table behind one [`RwLock`], so each write is trivially
//! atomic. Seeded with the default rule catalog.

use std::collections::BTreeMap;

use chrono::Utc;
use eviction_scoring::defaults::default_rules;
use eviction_types::{
    BonusQuestion, Contestant, ContestantId, PoolId, PoolSettings, ScoringRule, SpecialEvent, Team,
    WeekEventRecord, WinnersRecord,
};
use tokio::sync::RwLock;

use crate::store::{SeasonStore, StoreError, WeekWrite};

#[derive(Debug, Default)]
struct MemoryState {
    contestants: Vec<Contestant>,
    rules: Vec<ScoringRule>,
    weeks: BTreeMap<(PoolId, u32), WeekEventRecord>,
    special_events: Vec<SpecialEvent>,
    settings: BTreeMap<PoolId, PoolSettings>,
    teams: Vec<Team>,
    questions: Vec<BonusQuestion>,
    winners: BTreeMap<PoolId, WinnersRecord>,
}

/// A [`SeasonStore`] held entirely in memory.
#[derive(Debug)]
pub struct MemorySeasonStore {
    state: RwLock<MemoryState>,
}

impl Default for MemorySeasonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySeasonStore {
    /// An empty store seeded with the default rule catalog.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                rules: default_rules(),
                ..MemoryState::default()
            }),
        }
    }

    /// Add contestants to the roster.
    #[must_use]
    pub fn with_contestants(mut self, contestants: impl IntoIterator<Item = Contestant>) -> Self {
        self.state.get_mut().contestants.extend(contestants);
        self
    }

    /// Add a scoring rule.
    #[must_use]
    pub fn with_rule(mut self, rule: ScoringRule) -> Self {
        self.state.get_mut().rules.push(rule);
        self
    }

    /// Store settings for a pool.
    #[must_use]
    pub fn with_pool_settings(mut self, pool_id: PoolId, settings: PoolSettings) -> Self {
        self.state.get_mut().settings.insert(pool_id, settings);
        self
    }

    /// Add a team.
    #[must_use]
    pub fn with_team(mut self, team: Team) -> Self {
        self.state.get_mut().teams.push(team);
        self
    }

    /// Add a bonus question.
    #[must_use]
    pub fn with_bonus_question(mut self, question: BonusQuestion) -> Self {
        self.state.get_mut().questions.push(question);
        self
    }

    /// Record the correct answer to a bonus question.
    pub async fn answer_bonus_question(&self, question: &BonusQuestion, answer: &str) {
        let mut state = self.state.write().await;
        if let Some(stored) = state.questions.iter_mut().find(|q| q.id == question.id) {
            stored.correct_answer = Some(answer.to_owned());
        }
    }
}

impl SeasonStore for MemorySeasonStore {
    async fn load_contestants(&self, pool_id: PoolId) -> Result<Vec<Contestant>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .contestants
            .iter()
            .filter(|c| c.pool_id == pool_id)
            .cloned()
            .collect())
    }

    async fn load_scoring_rules(&self, pool_id: PoolId) -> Result<Vec<ScoringRule>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .rules
            .iter()
            .filter(|r| r.pool_id.is_none_or(|p| p == pool_id))
            .cloned()
            .collect())
    }

    async fn load_weeks(&self, pool_id: PoolId) -> Result<Vec<WeekEventRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .weeks
            .range((pool_id, 0)..=(pool_id, u32::MAX))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn load_week(
        &self,
        pool_id: PoolId,
        week: u32,
    ) -> Result<Option<WeekEventRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.weeks.get(&(pool_id, week)).cloned())
    }

    async fn load_special_events(&self, pool_id: PoolId) -> Result<Vec<SpecialEvent>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .special_events
            .iter()
            .filter(|e| e.pool_id == pool_id)
            .cloned()
            .collect())
    }

    async fn load_pool_settings(
        &self,
        pool_id: PoolId,
    ) -> Result<Option<PoolSettings>, StoreError> {
        let state = self.state.read().await;
        Ok(state.settings.get(&pool_id).cloned())
    }

    async fn load_teams(&self, pool_id: PoolId) -> Result<Vec<Team>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .teams
            .iter()
            .filter(|t| t.pool_id == pool_id)
            .cloned()
            .collect())
    }

    async fn load_bonus_questions(
        &self,
        pool_id: PoolId,
    ) -> Result<Vec<BonusQuestion>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .questions
            .iter()
            .filter(|q| q.pool_id == pool_id)
            .cloned()
            .collect())
    }

    async fn write_week(&self, write: WeekWrite) -> Result<WeekEventRecord, StoreError> {
        let mut state = self.state.write().await;
        let WeekWrite {
            mut record,
            expected_revision,
            special_events,
        } = write;
        let pool_id = record.pool_id;
        let week = record.week_number;

        if state.winners.contains_key(&pool_id) {
            return Err(StoreError::SeasonFrozen { pool_id });
        }

        let actual = state.weeks.get(&(pool_id, week)).map_or(0, |r| r.revision);
        if actual != expected_revision {
            return Err(StoreError::RevisionConflict {
                pool_id,
                week,
                expected: expected_revision,
                actual,
            });
        }

        if record.is_jury_phase {
            let claimed = state
                .weeks
                .range((pool_id, 0)..=(pool_id, u32::MAX))
                .find(|((_, w), r)| *w != week && r.is_jury_phase)
                .map(|((_, w), _)| *w);
            if let Some(claimed_by) = claimed {
                return Err(StoreError::JuryPhaseTaken { week, claimed_by });
            }
        }

        record.revision = actual.saturating_add(1);
        record.updated_at = Some(Utc::now());
        state.weeks.insert((pool_id, week), record.clone());

        if let Some(events) = special_events {
            state
                .special_events
                .retain(|e| !(e.pool_id == pool_id && e.week_number == week));
            state.special_events.extend(events);
        }
        Ok(record)
    }

    async fn delete_week(&self, pool_id: PoolId, week: u32) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.winners.contains_key(&pool_id) {
            return Err(StoreError::SeasonFrozen { pool_id });
        }
        let existed = state.weeks.remove(&(pool_id, week)).is_some();
        state
            .special_events
            .retain(|e| !(e.pool_id == pool_id && e.week_number == week));
        Ok(existed)
    }

    async fn set_final_placements(
        &self,
        pool_id: PoolId,
        placements: &BTreeMap<ContestantId, u32>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.winners.contains_key(&pool_id) {
            return Err(StoreError::SeasonFrozen { pool_id });
        }
        for contestant in state.contestants.iter_mut().filter(|c| c.pool_id == pool_id) {
            contestant.final_placement = placements.get(&contestant.id).copied();
        }
        Ok(())
    }

    async fn load_winners(&self, pool_id: PoolId) -> Result<Option<WinnersRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.winners.get(&pool_id).cloned())
    }

    async fn save_winners(&self, record: &WinnersRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.winners.contains_key(&record.pool_id) {
            return Err(StoreError::SeasonFrozen {
                pool_id: record.pool_id,
            });
        }
        state.winners.insert(record.pool_id, record.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eviction_types::WeekVariant;

    use super::*;

    fn write(record: WeekEventRecord, expected_revision: u64) -> WeekWrite {
        WeekWrite {
            record,
            expected_revision,
            special_events: None,
        }
    }

    #[tokio::test]
    async fn writes_bump_revision() {
        let store = MemorySeasonStore::new();
        let pool = PoolId::new();
        let record = WeekEventRecord::new(pool, 1, WeekVariant::Regular);

        let first = store.write_week(write(record.clone(), 0)).await.unwrap();
        assert_eq!(first.revision, 1);
        assert!(first.updated_at.is_some());

        let second = store.write_week(write(first, 1)).await.unwrap();
        assert_eq!(second.revision, 2);
    }

    #[tokio::test]
    async fn stale_write_conflicts_and_changes_nothing() {
        let store = MemorySeasonStore::new();
        let pool = PoolId::new();
        let record = WeekEventRecord::new(pool, 1, WeekVariant::Regular);
        store.write_week(write(record.clone(), 0)).await.unwrap();

        let mut stale = record;
        stale.is_jury_phase = true;
        let err = store.write_week(write(stale, 0)).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::RevisionConflict {
                pool_id: pool,
                week: 1,
                expected: 0,
                actual: 1,
            }
        );
        let stored = store.load_week(pool, 1).await.unwrap().unwrap();
        assert!(!stored.is_jury_phase);
    }

    #[tokio::test]
    async fn only_one_jury_week_per_pool() {
        let store = MemorySeasonStore::new();
        let pool = PoolId::new();
        let mut week5 = WeekEventRecord::new(pool, 5, WeekVariant::Regular);
        week5.is_jury_phase = true;
        store.write_week(write(week5.clone(), 0)).await.unwrap();

        let mut week6 = WeekEventRecord::new(pool, 6, WeekVariant::Regular);
        week6.is_jury_phase = true;
        let err = store.write_week(write(week6, 0)).await.unwrap_err();
        assert_eq!(err, StoreError::JuryPhaseTaken { week: 6, claimed_by: 5 });

        let other_pool = PoolId::new();
        let mut elsewhere = WeekEventRecord::new(other_pool, 6, WeekVariant::Regular);
        elsewhere.is_jury_phase = true;
        assert!(store.write_week(write(elsewhere, 0)).await.is_ok());

        // Rewriting the week that holds the flag is fine.
        week5.revision = 1;
        assert!(store.write_week(write(week5, 1)).await.is_ok());
    }

    #[tokio::test]
    async fn scoring_rules_include_defaults_and_own_pool_only() {
        let pool = PoolId::new();
        let own = ScoringRule::default_rule(
            eviction_types::ScoringCategory::Competition,
            "hoh_winner",
            12,
        )
        .for_pool(pool);
        let foreign = own.clone().for_pool(PoolId::new());
        let store = MemorySeasonStore::new().with_rule(own).with_rule(foreign);

        let rules = store.load_scoring_rules(pool).await.unwrap();
        assert_eq!(rules.len(), default_rules().len().saturating_add(1));
    }
}
