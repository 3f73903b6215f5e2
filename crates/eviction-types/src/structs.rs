//! Core entity structs: the roster, scoring rules, special events, teams,
//! and the season-end records.
//!
//! Week records live in [`crate::week`] because of their size.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ScoringCategory, StatusReason};
use crate::ids::{BonusQuestionId, ContestantId, PoolId, ScoringRuleId, SpecialEventId, TeamId};

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// A contestant on the show's roster for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Contestant {
    /// Unique contestant identifier.
    pub id: ContestantId,
    /// Display name.
    pub name: String,
    /// The pool this roster entry belongs to.
    pub pool_id: PoolId,
    /// Base roster flag. `false` means the contestant never entered play
    /// (or withdrew before any recorded week).
    pub is_active: bool,
    /// Final placement (1 = winner), set at season end.
    pub final_placement: Option<u32>,
}

/// A contestant's derived status as of one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ContestantStatus {
    /// The contestant.
    pub contestant_id: ContestantId,
    /// The week the status was resolved for.
    pub week: u32,
    /// Whether the contestant is in the game that week.
    pub active: bool,
    /// The event that last determined the status.
    pub reason: StatusReason,
}

// ---------------------------------------------------------------------------
// Scoring rules
// ---------------------------------------------------------------------------

/// One row of the scoring rule table.
///
/// `pool_id = None` marks a default rule that applies to every pool
/// without a pool-specific override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScoringRule {
    /// Unique rule identifier.
    pub id: ScoringRuleId,
    /// Owning pool, or `None` for a default rule.
    pub pool_id: Option<PoolId>,
    /// Rule category.
    pub category: ScoringCategory,
    /// Rule subcategory (see [`crate::subcategory`]).
    pub subcategory: String,
    /// Signed point value.
    pub points: i32,
    /// Inactive rules are ignored by lookups.
    pub is_active: bool,
    /// First week this version of the rule applies to.
    #[serde(default = "default_effective_week")]
    pub effective_from_week: u32,
}

const fn default_effective_week() -> u32 {
    1
}

impl ScoringRule {
    /// Build an active default rule effective from week 1.
    pub fn default_rule(category: ScoringCategory, subcategory: &str, points: i32) -> Self {
        Self {
            id: ScoringRuleId::new(),
            pool_id: None,
            category,
            subcategory: subcategory.to_owned(),
            points,
            is_active: true,
            effective_from_week: 1,
        }
    }

    /// Scope this rule to a pool.
    #[must_use]
    pub const fn for_pool(mut self, pool_id: PoolId) -> Self {
        self.pool_id = Some(pool_id);
        self
    }

    /// Make this rule version take effect from `week`.
    #[must_use]
    pub const fn effective_from(mut self, week: u32) -> Self {
        self.effective_from_week = week;
        self
    }
}

// ---------------------------------------------------------------------------
// Special events
// ---------------------------------------------------------------------------

/// An ad hoc occurrence recorded outside the ceremony fields.
///
/// `event_type` is either a literal subcategory (`"self_evicted"`) or a
/// reference to a rule row in the form `"rule:<uuid>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpecialEvent {
    /// Unique event identifier.
    pub id: SpecialEventId,
    /// Owning pool.
    pub pool_id: PoolId,
    /// The contestant the event applies to.
    pub contestant_id: ContestantId,
    /// Week the event happened in.
    pub week_number: u32,
    /// Subcategory literal or `rule:<uuid>` reference.
    pub event_type: String,
    /// Points added to the contestant's weekly bucket.
    pub points_awarded: i32,
    /// Free-text note shown to participants.
    pub description: String,
}

// ---------------------------------------------------------------------------
// Pool configuration
// ---------------------------------------------------------------------------

/// Per-pool settings consumed from the pool configuration owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PoolSettings {
    /// Maximum nominees per cycle (at least 2).
    pub max_nominees: u32,
    /// Number of contestants each team drafts.
    pub picks_per_team: u32,
    /// Special event subcategories this pool allows.
    pub enabled_special_events: Vec<String>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_nominees: 3,
            picks_per_team: 2,
            enabled_special_events: crate::subcategory::DEFAULT_SPECIAL_EVENTS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Teams and bonus questions
// ---------------------------------------------------------------------------

/// A participant's team: the contestants they drafted and their bonus
/// answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Team {
    /// Unique team identifier.
    pub id: TeamId,
    /// Owning pool.
    pub pool_id: PoolId,
    /// Display name.
    pub name: String,
    /// Drafted contestants.
    pub picks: Vec<ContestantId>,
    /// Answers to bonus questions, by question.
    #[serde(default)]
    pub bonus_answers: BTreeMap<BonusQuestionId, String>,
}

/// A season-long prediction question worth bonus points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BonusQuestion {
    /// Unique question identifier.
    pub id: BonusQuestionId,
    /// Owning pool.
    pub pool_id: PoolId,
    /// The question text.
    pub prompt: String,
    /// Points for a correct answer.
    pub points: i32,
    /// The correct answer, once known.
    pub correct_answer: Option<String>,
}

// ---------------------------------------------------------------------------
// Standings and season completion
// ---------------------------------------------------------------------------

/// One team's line on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TeamStanding {
    /// The team.
    pub team_id: TeamId,
    /// Team display name.
    pub team_name: String,
    /// 1-based rank; tied teams share a rank.
    pub rank: u32,
    /// Sum of the drafted contestants' cumulative points.
    pub contestant_points: i64,
    /// Points from correctly answered bonus questions.
    pub bonus_points: i64,
    /// `contestant_points + bonus_points`.
    pub total: i64,
}

/// The permanent record written when a season is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WinnersRecord {
    /// The completed pool.
    pub pool_id: PoolId,
    /// When the season was completed.
    pub completed_at: DateTime<Utc>,
    /// Leaderboard snapshot at completion.
    pub standings: Vec<TeamStanding>,
    /// Every team ranked first.
    pub winning_teams: Vec<TeamId>,
    /// The show's winner, from the finale ballot.
    pub season_winner: Option<ContestantId>,
    /// The show's runner-up, from the finale ballot.
    pub runner_up: Option<ContestantId>,
    /// The fan-vote winner, from the finale ballot.
    pub americas_favorite: Option<ContestantId>,
}
