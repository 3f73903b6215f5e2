//! Enumeration types for the eviction pool domain.
//!
//! Scoring categories, week variants, ceremony steps, and the derived
//! contestant status reasons shared by every downstream crate.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Scoring categories
// ---------------------------------------------------------------------------

/// Top-level grouping of a scoring rule.
///
/// A rule is keyed by `(category, subcategory)`. The category is a closed
/// set; the subcategory is free-form so pools can define custom special
/// event types. The well-known subcategories live in [`subcategory`].
///
/// [`subcategory`]: crate::subcategory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ScoringCategory {
    /// Weekly competitions: HOH, POV, Arena.
    Competition,
    /// Nomination and eviction ceremony outcomes.
    Ceremony,
    /// Season finale placements and awards.
    Finale,
    /// Ad hoc special events recorded outside the ceremony fields.
    Special,
}

impl ScoringCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 4] = [Self::Competition, Self::Ceremony, Self::Finale, Self::Special];

    /// The stable lowercase name used in storage and rule references.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Competition => "competition",
            Self::Ceremony => "ceremony",
            Self::Finale => "finale",
            Self::Special => "special",
        }
    }

    /// Parse a stored category name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl core::fmt::Display for ScoringCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Week variants
// ---------------------------------------------------------------------------

/// The shape of one week's ceremony.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WeekVariant {
    /// One HOH / nominations / veto / eviction cycle.
    #[default]
    Regular,
    /// Two back-to-back cycles in the same week.
    DoubleEviction,
    /// Three back-to-back cycles in the same week.
    TripleEviction,
    /// The finale: a flat ballot instead of an eviction cycle.
    Final,
}

impl WeekVariant {
    /// Number of eviction cycles this variant runs. The finale runs none.
    pub const fn cycle_count(self) -> usize {
        match self {
            Self::Regular => 1,
            Self::DoubleEviction => 2,
            Self::TripleEviction => 3,
            Self::Final => 0,
        }
    }

    /// Derive the variant from the three legacy boolean flags.
    ///
    /// Returns `None` when more than one flag is set, which no legal week
    /// can express.
    pub const fn from_flags(double: bool, triple: bool, final_week: bool) -> Option<Self> {
        match (double, triple, final_week) {
            (false, false, false) => Some(Self::Regular),
            (true, false, false) => Some(Self::DoubleEviction),
            (false, true, false) => Some(Self::TripleEviction),
            (false, false, true) => Some(Self::Final),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ceremony steps
// ---------------------------------------------------------------------------

/// A step of the eviction ceremony, derived from which fields are filled.
///
/// Steps are ordered: a cycle is in the first step whose field is still
/// missing. `AwaitingReplacement` and `AwaitingArena` are skipped when they
/// do not apply to the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CeremonyStep {
    /// No HOH winner recorded yet.
    AwaitingHoh,
    /// Fewer than two nominees recorded.
    AwaitingNominees,
    /// No POV winner recorded yet.
    AwaitingVeto,
    /// The veto decision (used or not, and on whom) is not recorded.
    AwaitingVetoDecision,
    /// The veto was used and no replacement nominee is named.
    AwaitingReplacement,
    /// The Arena applies and has no winner yet.
    AwaitingArena,
    /// No eviction outcome recorded yet.
    AwaitingEviction,
    /// Every step of the cycle is recorded.
    Complete,
}

impl CeremonyStep {
    /// Short human-readable label for advisory messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::AwaitingHoh => "HOH winner",
            Self::AwaitingNominees => "nominations",
            Self::AwaitingVeto => "POV winner",
            Self::AwaitingVetoDecision => "veto decision",
            Self::AwaitingReplacement => "replacement nominee",
            Self::AwaitingArena => "Arena winner",
            Self::AwaitingEviction => "eviction",
            Self::Complete => "complete",
        }
    }
}

// ---------------------------------------------------------------------------
// Special events and status
// ---------------------------------------------------------------------------

/// What a special event does to the roster once its identifier is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// Removed from the game by production.
    Eviction,
    /// Re-entered the game.
    Return,
    /// Left the game voluntarily.
    Quit,
    /// Points only; no roster effect.
    Other,
}

/// Why a contestant has the status reported for a given week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "reason", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StatusReason {
    /// Active from the start and nothing has changed it.
    Roster,
    /// Marked inactive on the roster with no recorded event explaining it.
    Withdrawn,
    /// Evicted by a ceremony in the given week.
    Evicted {
        /// Week of the eviction.
        week: u32,
    },
    /// Removed by a special event in the given week.
    Removed {
        /// Week of the removal.
        week: u32,
    },
    /// Quit the game in the given week.
    Quit {
        /// Week of the departure.
        week: u32,
    },
    /// Returned to the game in the given week.
    Returned {
        /// Week of the return.
        week: u32,
    },
}
