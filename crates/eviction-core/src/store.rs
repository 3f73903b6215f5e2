//! The persistence seam.
//!
//! [`SeasonStore`] abstracts the storage the lifecycle manager reads and
//! writes: the roster, scoring rules, week records, special events, pool
//! settings, teams, and the season's winners record. The `PostgreSQL`
//! implementation lives in `eviction-db`; [`MemorySeasonStore`] backs tests
//! and local tooling.
//!
//! The trait is used through generics, never as a trait object, so its
//! async methods need no boxing.
//!
//! [`MemorySeasonStore`]: crate::memory::MemorySeasonStore

use std::collections::BTreeMap;
use std::future::Future;

use eviction_types::{
    BonusQuestion, Contestant, ContestantId, PoolId, PoolSettings, ScoringRule, SpecialEvent, Team,
    WeekEventRecord, WinnersRecord,
};

/// Errors raised by a [`SeasonStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The week changed since the writer loaded it.
    #[error(
        "week {week} of pool {pool_id} was modified concurrently \
         (based on revision {expected}, stored revision is {actual})"
    )]
    RevisionConflict {
        /// The pool.
        pool_id: PoolId,
        /// The week.
        week: u32,
        /// The revision the write was based on.
        expected: u64,
        /// The revision currently stored.
        actual: u64,
    },

    /// Another week of the pool already starts the jury phase.
    #[error("week {week} cannot start the jury phase; week {claimed_by} already does")]
    JuryPhaseTaken {
        /// The week being written.
        week: u32,
        /// The week holding the flag.
        claimed_by: u32,
    },

    /// The season is complete; nothing more may be written.
    #[error("season of pool {pool_id} is complete and frozen")]
    SeasonFrozen {
        /// The pool.
        pool_id: PoolId,
    },

    /// The storage backend failed.
    #[error("storage backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

/// One atomic week write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekWrite {
    /// The record to store. Its `revision` is ignored; the store assigns
    /// the next one.
    pub record: WeekEventRecord,
    /// The revision the writer loaded; 0 for a week never saved.
    pub expected_revision: u64,
    /// When set, the week's special events are replaced by these in the
    /// same write.
    pub special_events: Option<Vec<SpecialEvent>>,
}

/// Storage consumed by the lifecycle manager.
///
/// Every write is atomic: on error nothing has changed.
pub trait SeasonStore: Send + Sync {
    /// The pool's roster.
    fn load_contestants(
        &self,
        pool_id: PoolId,
    ) -> impl Future<Output = Result<Vec<Contestant>, StoreError>> + Send;

    /// Default rules plus the pool's own rules.
    fn load_scoring_rules(
        &self,
        pool_id: PoolId,
    ) -> impl Future<Output = Result<Vec<ScoringRule>, StoreError>> + Send;

    /// Every week record of the pool, in week order.
    fn load_weeks(
        &self,
        pool_id: PoolId,
    ) -> impl Future<Output = Result<Vec<WeekEventRecord>, StoreError>> + Send;

    /// One week record, if saved.
    fn load_week(
        &self,
        pool_id: PoolId,
        week: u32,
    ) -> impl Future<Output = Result<Option<WeekEventRecord>, StoreError>> + Send;

    /// Every special event of the pool.
    fn load_special_events(
        &self,
        pool_id: PoolId,
    ) -> impl Future<Output = Result<Vec<SpecialEvent>, StoreError>> + Send;

    /// The pool's stored settings, if any.
    fn load_pool_settings(
        &self,
        pool_id: PoolId,
    ) -> impl Future<Output = Result<Option<PoolSettings>, StoreError>> + Send;

    /// The pool's teams.
    fn load_teams(&self, pool_id: PoolId)
    -> impl Future<Output = Result<Vec<Team>, StoreError>> + Send;

    /// The pool's bonus questions.
    fn load_bonus_questions(
        &self,
        pool_id: PoolId,
    ) -> impl Future<Output = Result<Vec<BonusQuestion>, StoreError>> + Send;

    /// Upsert a week record, optionally replacing its special events.
    ///
    /// Fails with [`StoreError::RevisionConflict`] when the stored revision
    /// differs from `expected_revision`, with
    /// [`StoreError::JuryPhaseTaken`] when the record claims the jury
    /// phase and another week already does, and with
    /// [`StoreError::SeasonFrozen`] once the season is complete. Returns
    /// the stored record with its new revision.
    fn write_week(
        &self,
        write: WeekWrite,
    ) -> impl Future<Output = Result<WeekEventRecord, StoreError>> + Send;

    /// Delete a week record and its special events. Returns whether a
    /// record existed.
    fn delete_week(
        &self,
        pool_id: PoolId,
        week: u32,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Persist final placements on the roster.
    fn set_final_placements(
        &self,
        pool_id: PoolId,
        placements: &BTreeMap<ContestantId, u32>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The winners record, once the season is complete.
    fn load_winners(
        &self,
        pool_id: PoolId,
    ) -> impl Future<Output = Result<Option<WinnersRecord>, StoreError>> + Send;

    /// Store the winners record, freezing the season.
    ///
    /// Fails with [`StoreError::SeasonFrozen`] if one already exists.
    fn save_winners(
        &self,
        record: &WinnersRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
