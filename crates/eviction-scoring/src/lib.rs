//! Scoring rule table, roster status resolution, and the points engine.
//!
//! Everything in this crate is a pure function of already-committed rows:
//! the roster, the week event records, the special events, and the scoring
//! rules. Nothing is accumulated incrementally, so recomputing on every
//! read is always safe and always yields the same answer.
//!
//! # Modules
//!
//! - [`rules`] -- The [`ScoringRuleTable`]: pool-scoped, versioned rule lookup.
//! - [`defaults`] -- The default rule catalog seeded into new installations.
//! - [`events`] -- Special-event ingestion into [`TaggedEvent`]s.
//! - [`roster`] -- The [`RosterResolver`]: as-of-week contestant status.
//! - [`points`] -- The points engine producing a [`PointsTable`].
//! - [`standings`] -- Team leaderboard built from a [`PointsTable`].
//!
//! # Usage
//!
//! ```
//! use eviction_scoring::{PointsInput, ScoringRuleTable, compute_points, defaults};
//! use eviction_types::{ContestantId, PoolId, WeekEventRecord, WeekVariant};
//!
//! let pool = PoolId::new();
//! let rules = ScoringRuleTable::new(pool, defaults::default_rules());
//! let alice = ContestantId::new();
//!
//! let mut week = WeekEventRecord::new(pool, 1, WeekVariant::Regular);
//! if let Some(cycle) = week.cycles.first_mut() {
//!     cycle.hoh_winner = Some(alice);
//! }
//!
//! let table = compute_points(&PointsInput {
//!     pool_id: pool,
//!     contestants: &[],
//!     weeks: &[week],
//!     special_events: &[],
//!     rules: &rules,
//!     include_drafts: true,
//! });
//! assert_eq!(table.total_for(alice), 10);
//! ```

pub mod defaults;
pub mod events;
pub mod points;
pub mod roster;
pub mod rules;
pub mod standings;

// Re-export primary types at crate root.
pub use events::{TaggedEvent, ingest_special_events};
pub use points::{
    AwardSource, ContestantPoints, PointAward, PointsInput, PointsTable, compute_points,
};
pub use roster::RosterResolver;
pub use rules::ScoringRuleTable;
pub use standings::{answer_matches, compute_standings};

use eviction_types::{ScoringCategory, ScoringRuleId};

// ---------------------------------------------------------------------------
// Configuration warnings
// ---------------------------------------------------------------------------

/// A non-fatal problem with the scoring rule configuration.
///
/// Rule problems never fail a computation: a missing rule scores 0 and a
/// duplicated rule is resolved deterministically. The warning is logged
/// and returned alongside the result so administrators can fix the table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, thiserror::Error)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum RuleConfigWarning {
    /// No active rule (pool-scoped or default) exists for the key.
    #[error("no active scoring rule for {category}/{subcategory} in week {week}; scoring 0")]
    MissingRule {
        /// Rule category.
        category: ScoringCategory,
        /// Rule subcategory.
        subcategory: String,
        /// The week the lookup was for.
        week: u32,
    },

    /// More than one active rule shares a scope, key, and effective week.
    #[error(
        "duplicate active scoring rules for {category}/{subcategory} \
         (pool scoped: {pool_scoped}, from week {effective_from_week}); using {kept}"
    )]
    DuplicateRule {
        /// Rule category.
        category: ScoringCategory,
        /// Rule subcategory.
        subcategory: String,
        /// Whether the duplicates are pool-scoped or defaults.
        pool_scoped: bool,
        /// The shared effective week.
        effective_from_week: u32,
        /// The rule that wins lookups.
        kept: ScoringRuleId,
        /// The rules that are ignored.
        ignored: Vec<ScoringRuleId>,
    },

    /// A special event references a rule id that does not exist.
    #[error("special event references unknown rule {reference:?}")]
    UnknownRuleReference {
        /// The stored identifier.
        reference: String,
    },
}
