//! The draft / submission lifecycle manager.
//!
//! [`SeasonService`] is the library API the administrative surface and
//! the leaderboard views call. Weeks move `Draft -> Complete` and back:
//! saving a draft reopens a completed week, and clearing a week wipes it.
//! Season completion is the only one-way transition; it freezes every
//! further write.
//!
//! Reads recompute from committed rows every time. Writes run the
//! ceremony checks first and then hand the store one atomic
//! [`WeekWrite`], so a refused write leaves nothing behind.

use std::collections::BTreeMap;

use chrono::Utc;
use eviction_ceremony::{
    CeremonyContext, ConstraintViolation, IncompleteWeekError, WeekProgress, check_constraints,
    validate_for_submit, week_progress,
};
use eviction_scoring::events::ingest_special_events;
use eviction_scoring::{
    PointsInput, PointsTable, RosterResolver, ScoringRuleTable, compute_points, compute_standings,
};
use eviction_types::{
    BonusQuestion, Contestant, ContestantId, ContestantStatus, PoolId, PoolSettings, SpecialEvent,
    Team, TeamStanding, WeekEventRecord, WeekVariant, WinnersRecord,
};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::season::{IncompleteSeasonError, SeasonChecklist, SeasonInputs, evaluate};
use crate::store::{SeasonStore, StoreError, WeekWrite};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by [`SeasonService`].
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The store refused or failed the operation.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The write contradicts a structural constraint.
    #[error("constraint violation: {source}")]
    Constraint {
        /// The violated constraint.
        #[from]
        source: ConstraintViolation,
    },

    /// Submit refused: the week has unmet steps.
    #[error("{source}")]
    IncompleteWeek {
        /// Every unmet step.
        #[from]
        source: IncompleteWeekError,
    },

    /// Season completion refused: checks are failing.
    #[error("{source}")]
    IncompleteSeason {
        /// The failing checks.
        #[from]
        source: IncompleteSeasonError,
    },
}

// ---------------------------------------------------------------------------
// Requests and views
// ---------------------------------------------------------------------------

/// A week as sent by the editor.
///
/// `record.revision` is the revision the editor loaded; the write fails
/// with [`StoreError::RevisionConflict`] if the week changed since.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeekDraft {
    /// The week's fields.
    pub record: WeekEventRecord,
    /// When set, replaces the week's special events in the same write.
    #[serde(default)]
    pub special_events: Option<Vec<SpecialEvent>>,
}

impl WeekDraft {
    /// A draft that leaves the week's special events untouched.
    pub const fn new(record: WeekEventRecord) -> Self {
        Self {
            record,
            special_events: None,
        }
    }

    /// Replace the week's special events with `events`.
    #[must_use]
    pub fn with_special_events(mut self, events: Vec<SpecialEvent>) -> Self {
        self.special_events = Some(events);
        self
    }
}

/// A week record with its derived ceremony progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSnapshot {
    /// The stored record, or a blank draft at revision 0.
    pub record: WeekEventRecord,
    /// The week's special events.
    pub special_events: Vec<SpecialEvent>,
    /// Per-cycle steps, issues, and enabled actions.
    pub progress: WeekProgress,
}

// ---------------------------------------------------------------------------
// Loaded season
// ---------------------------------------------------------------------------

/// Every committed row of one pool.
struct Season {
    pool_id: PoolId,
    contestants: Vec<Contestant>,
    rules: ScoringRuleTable,
    weeks: Vec<WeekEventRecord>,
    special_events: Vec<SpecialEvent>,
    settings: PoolSettings,
    teams: Vec<Team>,
    questions: Vec<BonusQuestion>,
    winners: Option<WinnersRecord>,
}

impl Season {
    /// Roster status replayed from the committed log, with `replacement`
    /// standing in for the committed special events of `week`.
    fn roster(&self, week: u32, replacement: Option<&[SpecialEvent]>) -> RosterResolver {
        let events: Vec<SpecialEvent> = match replacement {
            Some(draft_events) => self
                .special_events
                .iter()
                .filter(|e| e.week_number != week)
                .chain(draft_events.iter())
                .cloned()
                .collect(),
            None => self.special_events.clone(),
        };
        let (tagged, _) = ingest_special_events(&events, &self.rules);
        RosterResolver::new(&self.contestants, &self.weeks, &tagged)
    }

    fn jury_phase_week(&self, excluding: u32) -> Option<u32> {
        self.weeks
            .iter()
            .find(|w| w.is_jury_phase && w.week_number != excluding)
            .map(|w| w.week_number)
    }

    fn week_events(&self, week: u32) -> Vec<SpecialEvent> {
        self.special_events
            .iter()
            .filter(|e| e.week_number == week)
            .cloned()
            .collect()
    }

    fn points(&self, include_drafts: bool) -> PointsTable {
        compute_points(&PointsInput {
            pool_id: self.pool_id,
            contestants: &self.contestants,
            weeks: &self.weeks,
            special_events: &self.special_events,
            rules: &self.rules,
            include_drafts,
        })
    }

    fn final_week(&self) -> Option<&WeekEventRecord> {
        self.weeks.iter().find(|w| w.is_final_week())
    }

    fn checklist(&self) -> SeasonChecklist {
        evaluate(&SeasonInputs {
            pool_id: self.pool_id,
            contestants: &self.contestants,
            weeks: &self.weeks,
            teams: &self.teams,
            questions: &self.questions,
            settings: &self.settings,
            completed: self.winners.is_some(),
        })
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// The lifecycle manager over a [`SeasonStore`].
#[derive(Debug)]
pub struct SeasonService<S> {
    store: S,
    pool_defaults: PoolSettings,
    include_drafts: bool,
}

impl<S: SeasonStore> SeasonService<S> {
    /// A service using the built-in pool defaults, counting draft weeks.
    pub fn new(store: S) -> Self {
        Self {
            store,
            pool_defaults: PoolSettings::default(),
            include_drafts: true,
        }
    }

    /// A service configured from `config`.
    pub fn with_config(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            pool_defaults: config.pool_defaults.to_settings(),
            include_drafts: config.scoring.include_draft_weeks,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    async fn load(&self, pool_id: PoolId) -> Result<Season, LifecycleError> {
        let store = &self.store;
        let (contestants, rules, weeks, special_events, settings, teams, questions, winners) =
            tokio::try_join!(
                store.load_contestants(pool_id),
                store.load_scoring_rules(pool_id),
                store.load_weeks(pool_id),
                store.load_special_events(pool_id),
                store.load_pool_settings(pool_id),
                store.load_teams(pool_id),
                store.load_bonus_questions(pool_id),
                store.load_winners(pool_id),
            )?;

        let rules = ScoringRuleTable::new(pool_id, rules);
        for warning in rules.warnings() {
            tracing::warn!(pool_id = %pool_id, %warning, "scoring rule configuration");
        }

        Ok(Season {
            pool_id,
            contestants,
            rules,
            weeks,
            special_events,
            settings: settings.unwrap_or_else(|| self.pool_defaults.clone()),
            teams,
            questions,
            winners,
        })
    }

    fn ensure_open(season: &Season) -> Result<(), LifecycleError> {
        if season.winners.is_some() {
            return Err(StoreError::SeasonFrozen {
                pool_id: season.pool_id,
            }
            .into());
        }
        Ok(())
    }

    /// One week with its ceremony progress. A week never saved comes back
    /// as a blank regular-week draft at revision 0.
    pub async fn get_week_event_record(
        &self,
        pool_id: PoolId,
        week: u32,
    ) -> Result<WeekSnapshot, LifecycleError> {
        let season = self.load(pool_id).await?;
        let record = season
            .weeks
            .iter()
            .find(|w| w.week_number == week)
            .cloned()
            .unwrap_or_else(|| WeekEventRecord::new(pool_id, week, WeekVariant::Regular));

        let roster = season.roster(week, None);
        let ctx = CeremonyContext {
            settings: &season.settings,
            roster: &roster,
            rules: &season.rules,
            jury_phase_week: season.jury_phase_week(week),
        };
        let progress = week_progress(&ctx, &record);
        Ok(WeekSnapshot {
            special_events: season.week_events(week),
            record,
            progress,
        })
    }

    async fn write(&self, draft: WeekDraft, submit: bool) -> Result<WeekSnapshot, LifecycleError> {
        let WeekDraft {
            mut record,
            special_events,
        } = draft;
        let pool_id = record.pool_id;
        let week = record.week_number;

        let season = self.load(pool_id).await?;
        Self::ensure_open(&season)?;

        let roster = season.roster(week, special_events.as_deref());
        let ctx = CeremonyContext {
            settings: &season.settings,
            roster: &roster,
            rules: &season.rules,
            jury_phase_week: season.jury_phase_week(week),
        };

        check_constraints(&ctx, &record, special_events.as_deref().unwrap_or_default())?;
        if submit {
            validate_for_submit(&ctx, &record)?;
        }

        record.is_draft = !submit;
        record.is_complete = submit;
        let expected_revision = record.revision;
        let stored = self
            .store
            .write_week(WeekWrite {
                record,
                expected_revision,
                special_events: special_events.clone(),
            })
            .await?;

        tracing::info!(
            pool_id = %pool_id,
            week,
            revision = stored.revision,
            submitted = submit,
            "Week saved"
        );

        let progress = week_progress(&ctx, &stored);
        let events = special_events.unwrap_or_else(|| season.week_events(week));
        Ok(WeekSnapshot {
            record: stored,
            special_events: events,
            progress,
        })
    }

    /// Autosave a week as a draft.
    ///
    /// Step issues are advisory here and come back in the snapshot's
    /// progress. Saving a completed week reopens it.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Constraint`] for a structural contradiction, or
    /// [`LifecycleError::Store`] for a stale revision, a second jury week,
    /// or a frozen season. Nothing is written on error.
    pub async fn save_draft(&self, draft: WeekDraft) -> Result<WeekSnapshot, LifecycleError> {
        self.write(draft, false).await
    }

    /// Submit a week, marking it complete.
    ///
    /// # Errors
    ///
    /// Everything [`save_draft`](Self::save_draft) refuses, plus
    /// [`LifecycleError::IncompleteWeek`] naming every unmet step. Nothing
    /// is written on error.
    pub async fn submit_week(&self, draft: WeekDraft) -> Result<WeekSnapshot, LifecycleError> {
        self.write(draft, true).await
    }

    /// Wipe a week's record and its special events. Returns whether a
    /// record existed.
    pub async fn clear_week(&self, pool_id: PoolId, week: u32) -> Result<bool, LifecycleError> {
        let existed = self.store.delete_week(pool_id, week).await?;
        tracing::info!(pool_id = %pool_id, week, existed, "Week cleared");
        Ok(existed)
    }

    /// Every contestant's weekly and cumulative points.
    pub async fn compute_points(&self, pool_id: PoolId) -> Result<PointsTable, LifecycleError> {
        let season = self.load(pool_id).await?;
        Ok(season.points(self.include_drafts))
    }

    /// A contestant's status as of `week`, that week's events included.
    pub async fn status_as_of_week(
        &self,
        pool_id: PoolId,
        contestant_id: ContestantId,
        week: u32,
    ) -> Result<ContestantStatus, LifecycleError> {
        let season = self.load(pool_id).await?;
        Ok(season.roster(week, None).status_as_of_week(contestant_id, week))
    }

    /// The team leaderboard.
    pub async fn standings(&self, pool_id: PoolId) -> Result<Vec<TeamStanding>, LifecycleError> {
        let season = self.load(pool_id).await?;
        let points = season.points(self.include_drafts);
        Ok(compute_standings(&season.teams, &season.questions, &points))
    }

    /// Derive and persist every contestant's final placement from the
    /// event log and the finale ballot.
    pub async fn assign_final_placements(
        &self,
        pool_id: PoolId,
    ) -> Result<BTreeMap<ContestantId, u32>, LifecycleError> {
        let season = self.load(pool_id).await?;
        Self::ensure_open(&season)?;

        let ballot = season.final_week().and_then(|w| w.finale.as_ref());
        let placements = season.roster(u32::MAX, None).final_placements(ballot);
        self.store.set_final_placements(pool_id, &placements).await?;
        tracing::info!(pool_id = %pool_id, placed = placements.len(), "Final placements assigned");
        Ok(placements)
    }

    /// The named season-completion checklist.
    pub async fn validate_season_completion(
        &self,
        pool_id: PoolId,
    ) -> Result<SeasonChecklist, LifecycleError> {
        let season = self.load(pool_id).await?;
        Ok(season.checklist())
    }

    /// Complete the season: snapshot the standings into a
    /// [`WinnersRecord`] and freeze every further write.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::IncompleteSeason`] with the failing checks, or
    /// [`LifecycleError::Store`] if another caller completed it first.
    pub async fn complete_season(&self, pool_id: PoolId) -> Result<WinnersRecord, LifecycleError> {
        let season = self.load(pool_id).await?;
        let checklist = season.checklist();
        if !checklist.is_ready() {
            let failing = checklist.failing();
            tracing::info!(
                pool_id = %pool_id,
                failing = failing.len(),
                "Season completion refused"
            );
            return Err(IncompleteSeasonError { pool_id, failing }.into());
        }

        let points = season.points(self.include_drafts);
        let standings = compute_standings(&season.teams, &season.questions, &points);
        let winning_teams = standings
            .iter()
            .filter(|s| s.rank == 1)
            .map(|s| s.team_id)
            .collect();
        let ballot = season
            .final_week()
            .and_then(|w| w.finale.clone())
            .unwrap_or_default();

        let record = WinnersRecord {
            pool_id,
            completed_at: Utc::now(),
            standings,
            winning_teams,
            season_winner: ballot.winner,
            runner_up: ballot.runner_up,
            americas_favorite: ballot.americas_favorite,
        };
        self.store.save_winners(&record).await?;
        tracing::info!(
            pool_id = %pool_id,
            winning_teams = record.winning_teams.len(),
            "Season completed"
        );
        Ok(record)
    }
}
