//! The week event record: one week's structured ceremony facts.
//!
//! A regular week runs one [`EvictionCycle`]; double and triple eviction
//! weeks run two or three cycles in the same record, each with its own
//! isolated fields. The finale replaces the cycles with a [`FinalBallot`].
//!
//! Everything here is plain data plus the set arithmetic every consumer
//! needs (final nominees, eviction candidates). Step derivation and
//! validation live in `eviction-ceremony`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::WeekVariant;
use crate::ids::{ContestantId, PoolId};

/// The sentinel stored when a ceremony ends without an eviction.
pub const NO_EVICTION: &str = "no-eviction";

/// The recorded outcome of an eviction ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", content = "contestant_id", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EvictionOutcome {
    /// The named contestant was evicted.
    Evicted(ContestantId),
    /// The ceremony was held (or cancelled) and nobody left.
    NoEviction,
}

impl EvictionOutcome {
    /// The evicted contestant, if any.
    pub const fn contestant(self) -> Option<ContestantId> {
        match self {
            Self::Evicted(id) => Some(id),
            Self::NoEviction => None,
        }
    }
}

/// One HOH / nominations / veto / eviction cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EvictionCycle {
    /// Head of Household winner.
    pub hoh_winner: Option<ContestantId>,
    /// Initial nominees, in nomination order.
    #[serde(default)]
    pub nominees: Vec<ContestantId>,
    /// Power of Veto winner.
    pub pov_winner: Option<ContestantId>,
    /// Tri-state veto decision: unknown, used, or not used.
    pub pov_used: Option<bool>,
    /// The nominee the veto was used on.
    pub pov_used_on: Option<ContestantId>,
    /// Nominee named by the HOH after the veto was used.
    pub replacement_nominee: Option<ContestantId>,
    /// Whether the Arena competition is played this cycle.
    #[serde(default)]
    pub ai_arena_enabled: bool,
    /// The Arena winner, who is safe from eviction.
    pub ai_arena_winner: Option<ContestantId>,
    /// The eviction outcome.
    pub evicted: Option<EvictionOutcome>,
}

impl EvictionCycle {
    /// Whether the veto decision says the veto was used.
    pub fn veto_used(&self) -> bool {
        self.pov_used == Some(true)
    }

    /// The nominees facing the house after the veto meeting.
    ///
    /// Starts from the initial nominees, removes the veto target when the
    /// veto was used, and appends the replacement nominee. Order is
    /// preserved so displays stay stable.
    pub fn final_nominees(&self) -> Vec<ContestantId> {
        let saved = if self.veto_used() { self.pov_used_on } else { None };
        let mut result: Vec<ContestantId> = self
            .nominees
            .iter()
            .copied()
            .filter(|id| Some(*id) != saved)
            .collect();
        if self.veto_used() {
            if let Some(replacement) = self.replacement_nominee {
                if !result.contains(&replacement) {
                    result.push(replacement);
                }
            }
        }
        result
    }

    /// Whether the Arena step applies: enabled and at least three final
    /// nominees.
    pub fn arena_applies(&self) -> bool {
        self.ai_arena_enabled && self.final_nominees().len() >= 3
    }

    /// Final nominees minus the Arena winner: who may legally be evicted.
    pub fn eviction_candidates(&self) -> Vec<ContestantId> {
        let safe = self.ai_arena_winner;
        self.final_nominees()
            .into_iter()
            .filter(|id| Some(*id) != safe)
            .collect()
    }

    /// The contestant this cycle evicted, if any.
    pub fn evicted_contestant(&self) -> Option<ContestantId> {
        self.evicted.and_then(EvictionOutcome::contestant)
    }

    /// Whether no field of the cycle has been filled in.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Every contestant named anywhere in the cycle.
    pub fn named_contestants(&self) -> Vec<ContestantId> {
        let mut named: Vec<ContestantId> = Vec::new();
        named.extend(self.hoh_winner);
        named.extend(self.nominees.iter().copied());
        named.extend(self.pov_winner);
        named.extend(self.pov_used_on);
        named.extend(self.replacement_nominee);
        named.extend(self.ai_arena_winner);
        named.extend(self.evicted_contestant());
        named.sort_unstable();
        named.dedup();
        named
    }
}

/// The finale ballot, replacing the eviction cycle in the final week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FinalBallot {
    /// Winner of the final HOH competition.
    pub final_hoh_winner: Option<ContestantId>,
    /// Season winner.
    pub winner: Option<ContestantId>,
    /// Season runner-up.
    pub runner_up: Option<ContestantId>,
    /// Fan-vote winner.
    pub americas_favorite: Option<ContestantId>,
}

impl FinalBallot {
    /// Every contestant named on the ballot.
    pub fn named_contestants(&self) -> Vec<ContestantId> {
        let mut named: Vec<ContestantId> = [
            self.final_hoh_winner,
            self.winner,
            self.runner_up,
            self.americas_favorite,
        ]
        .into_iter()
        .flatten()
        .collect();
        named.sort_unstable();
        named.dedup();
        named
    }
}

/// One week's recorded ceremony facts for a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeekEventRecord {
    /// Owning pool.
    pub pool_id: PoolId,
    /// Week number, unique per pool, starting at 1.
    pub week_number: u32,
    /// The ceremony shape of this week.
    pub variant: WeekVariant,
    /// Unsubmitted and freely editable.
    pub is_draft: bool,
    /// Marked complete by a successful submit.
    pub is_complete: bool,
    /// This week starts the jury phase. At most one week per pool.
    pub is_jury_phase: bool,
    /// The eviction cycles, one per [`WeekVariant::cycle_count`].
    #[serde(default)]
    pub cycles: Vec<EvictionCycle>,
    /// The finale ballot; present only for [`WeekVariant::Final`].
    pub finale: Option<FinalBallot>,
    /// Write counter used for optimistic concurrency. 0 = never saved.
    #[serde(default)]
    pub revision: u64,
    /// When the record was last written.
    pub updated_at: Option<DateTime<Utc>>,
}

impl WeekEventRecord {
    /// A blank draft with the right number of cycles for `variant`.
    pub fn new(pool_id: PoolId, week_number: u32, variant: WeekVariant) -> Self {
        let mut record = Self {
            pool_id,
            week_number,
            variant: WeekVariant::Regular,
            is_draft: true,
            is_complete: false,
            is_jury_phase: false,
            cycles: Vec::new(),
            finale: None,
            revision: 0,
            updated_at: None,
        };
        record.set_variant(variant);
        record
    }

    /// Switch the week's shape, keeping the cycles that still fit.
    ///
    /// Growing appends blank cycles; shrinking drops the trailing cycles.
    /// Switching to the finale drops all cycles and opens a blank ballot.
    pub fn set_variant(&mut self, variant: WeekVariant) {
        self.variant = variant;
        self.cycles.resize_with(variant.cycle_count(), EvictionCycle::default);
        if variant == WeekVariant::Final {
            if self.finale.is_none() {
                self.finale = Some(FinalBallot::default());
            }
        } else {
            self.finale = None;
        }
    }

    /// Double eviction flag, as stored in the flat shape.
    pub fn is_double_eviction(&self) -> bool {
        self.variant == WeekVariant::DoubleEviction
    }

    /// Triple eviction flag, as stored in the flat shape.
    pub fn is_triple_eviction(&self) -> bool {
        self.variant == WeekVariant::TripleEviction
    }

    /// Finale flag, as stored in the flat shape.
    pub fn is_final_week(&self) -> bool {
        self.variant == WeekVariant::Final
    }

    /// Contestants evicted by this week's cycles, with their cycle index.
    pub fn evictions(&self) -> impl Iterator<Item = (usize, ContestantId)> + '_ {
        self.cycles
            .iter()
            .enumerate()
            .filter_map(|(index, cycle)| cycle.evicted_contestant().map(|id| (index, id)))
    }

    /// Every contestant named anywhere in the week.
    pub fn named_contestants(&self) -> Vec<ContestantId> {
        let mut named: Vec<ContestantId> = self
            .cycles
            .iter()
            .flat_map(EvictionCycle::named_contestants)
            .collect();
        if let Some(ballot) = &self.finale {
            named.extend(ballot.named_contestants());
        }
        named.sort_unstable();
        named.dedup();
        named
    }
}
