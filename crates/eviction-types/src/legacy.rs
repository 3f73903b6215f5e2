//! Serialization adapter for the legacy flat week-record shape.
//!
//! Older storage and admin clients keep double and triple eviction weeks as
//! duplicated `second_*` / `third_*` column groups next to the first cycle,
//! with the eviction stored as a contestant id string or the
//! `"no-eviction"` sentinel. [`LegacyWeekRecord`] is that shape;
//! conversions to and from [`WeekEventRecord`] are lossless for every
//! well-formed record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::WeekVariant;
use crate::ids::{ContestantId, PoolId};
use crate::week::{EvictionCycle, EvictionOutcome, FinalBallot, NO_EVICTION, WeekEventRecord};

/// Errors converting a flat record into a [`WeekEventRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegacyShapeError {
    /// More than one of the double / triple / final flags is set.
    #[error("week {week}: conflicting variant flags")]
    ConflictingVariantFlags {
        /// The offending week.
        week: u32,
    },

    /// An `evicted` column holds neither a contestant id nor the sentinel.
    #[error("week {week}: unrecognised evicted value {value:?}")]
    InvalidEvicted {
        /// The offending week.
        week: u32,
        /// The stored value.
        value: String,
    },
}

/// The flat, duplicated-column week record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[allow(clippy::struct_excessive_bools)]
pub struct LegacyWeekRecord {
    /// Owning pool.
    pub pool_id: PoolId,
    /// Week number.
    pub week_number: u32,
    /// Draft flag.
    pub is_draft: bool,
    /// Completion flag.
    pub is_complete: bool,
    /// Double eviction flag.
    pub is_double_eviction: bool,
    /// Triple eviction flag.
    pub is_triple_eviction: bool,
    /// Finale flag.
    pub is_final_week: bool,
    /// Jury phase flag.
    pub is_jury_phase: bool,

    /// Cycle 1 HOH winner.
    pub hoh_winner: Option<ContestantId>,
    /// Cycle 1 nominees.
    #[serde(default)]
    pub nominees: Vec<ContestantId>,
    /// Cycle 1 POV winner.
    pub pov_winner: Option<ContestantId>,
    /// Cycle 1 veto decision.
    pub pov_used: Option<bool>,
    /// Cycle 1 veto target.
    pub pov_used_on: Option<ContestantId>,
    /// Cycle 1 replacement nominee.
    pub replacement_nominee: Option<ContestantId>,
    /// Cycle 1 Arena toggle.
    #[serde(default)]
    pub ai_arena_enabled: bool,
    /// Cycle 1 Arena winner.
    pub ai_arena_winner: Option<ContestantId>,
    /// Cycle 1 eviction: contestant id or `"no-eviction"`.
    pub evicted: Option<String>,

    /// Cycle 2 HOH winner.
    pub second_hoh_winner: Option<ContestantId>,
    /// Cycle 2 nominees.
    #[serde(default)]
    pub second_nominees: Vec<ContestantId>,
    /// Cycle 2 POV winner.
    pub second_pov_winner: Option<ContestantId>,
    /// Cycle 2 veto decision.
    pub second_pov_used: Option<bool>,
    /// Cycle 2 veto target.
    pub second_pov_used_on: Option<ContestantId>,
    /// Cycle 2 replacement nominee.
    pub second_replacement_nominee: Option<ContestantId>,
    /// Cycle 2 Arena toggle.
    #[serde(default)]
    pub second_ai_arena_enabled: bool,
    /// Cycle 2 Arena winner.
    pub second_ai_arena_winner: Option<ContestantId>,
    /// Cycle 2 eviction.
    pub second_evicted: Option<String>,

    /// Cycle 3 HOH winner.
    pub third_hoh_winner: Option<ContestantId>,
    /// Cycle 3 nominees.
    #[serde(default)]
    pub third_nominees: Vec<ContestantId>,
    /// Cycle 3 POV winner.
    pub third_pov_winner: Option<ContestantId>,
    /// Cycle 3 veto decision.
    pub third_pov_used: Option<bool>,
    /// Cycle 3 veto target.
    pub third_pov_used_on: Option<ContestantId>,
    /// Cycle 3 replacement nominee.
    pub third_replacement_nominee: Option<ContestantId>,
    /// Cycle 3 Arena toggle.
    #[serde(default)]
    pub third_ai_arena_enabled: bool,
    /// Cycle 3 Arena winner.
    pub third_ai_arena_winner: Option<ContestantId>,
    /// Cycle 3 eviction.
    pub third_evicted: Option<String>,

    /// Finale: final HOH winner.
    pub final_hoh_winner: Option<ContestantId>,
    /// Finale: season winner.
    pub winner: Option<ContestantId>,
    /// Finale: runner-up.
    pub runner_up: Option<ContestantId>,
    /// Finale: fan-vote winner.
    pub americas_favorite: Option<ContestantId>,

    /// Optimistic concurrency counter.
    #[serde(default)]
    pub revision: u64,
    /// Last write time.
    pub updated_at: Option<DateTime<Utc>>,
}

fn encode_evicted(outcome: Option<EvictionOutcome>) -> Option<String> {
    outcome.map(|o| match o {
        EvictionOutcome::Evicted(id) => id.to_string(),
        EvictionOutcome::NoEviction => NO_EVICTION.to_owned(),
    })
}

fn decode_evicted(
    week: u32,
    value: Option<&str>,
) -> Result<Option<EvictionOutcome>, LegacyShapeError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(NO_EVICTION) => Ok(Some(EvictionOutcome::NoEviction)),
        Some(raw) => raw
            .parse::<ContestantId>()
            .map(|id| Some(EvictionOutcome::Evicted(id)))
            .map_err(|_parse| LegacyShapeError::InvalidEvicted {
                week,
                value: raw.to_owned(),
            }),
    }
}

/// Reads one prefixed column group out of a flat record.
macro_rules! read_cycle {
    ($flat:expr, $hoh:ident, $noms:ident, $pov:ident, $used:ident, $used_on:ident,
     $repl:ident, $arena_on:ident, $arena_win:ident, $evicted:ident) => {
        EvictionCycle {
            hoh_winner: $flat.$hoh,
            nominees: $flat.$noms.clone(),
            pov_winner: $flat.$pov,
            pov_used: $flat.$used,
            pov_used_on: $flat.$used_on,
            replacement_nominee: $flat.$repl,
            ai_arena_enabled: $flat.$arena_on,
            ai_arena_winner: $flat.$arena_win,
            evicted: decode_evicted($flat.week_number, $flat.$evicted.as_deref())?,
        }
    };
}

/// Writes one cycle into a prefixed column group of a flat record.
macro_rules! write_cycle {
    ($flat:expr, $cycle:expr, $hoh:ident, $noms:ident, $pov:ident, $used:ident, $used_on:ident,
     $repl:ident, $arena_on:ident, $arena_win:ident, $evicted:ident) => {
        if let Some(cycle) = $cycle {
            $flat.$hoh = cycle.hoh_winner;
            $flat.$noms = cycle.nominees.clone();
            $flat.$pov = cycle.pov_winner;
            $flat.$used = cycle.pov_used;
            $flat.$used_on = cycle.pov_used_on;
            $flat.$repl = cycle.replacement_nominee;
            $flat.$arena_on = cycle.ai_arena_enabled;
            $flat.$arena_win = cycle.ai_arena_winner;
            $flat.$evicted = encode_evicted(cycle.evicted);
        }
    };
}

impl From<&WeekEventRecord> for LegacyWeekRecord {
    fn from(record: &WeekEventRecord) -> Self {
        let mut flat = Self {
            pool_id: record.pool_id,
            week_number: record.week_number,
            is_draft: record.is_draft,
            is_complete: record.is_complete,
            is_double_eviction: record.is_double_eviction(),
            is_triple_eviction: record.is_triple_eviction(),
            is_final_week: record.is_final_week(),
            is_jury_phase: record.is_jury_phase,
            revision: record.revision,
            updated_at: record.updated_at,
            ..Self::default()
        };

        write_cycle!(flat, record.cycles.first(), hoh_winner, nominees, pov_winner, pov_used,
            pov_used_on, replacement_nominee, ai_arena_enabled, ai_arena_winner, evicted);
        write_cycle!(flat, record.cycles.get(1), second_hoh_winner, second_nominees,
            second_pov_winner, second_pov_used, second_pov_used_on, second_replacement_nominee,
            second_ai_arena_enabled, second_ai_arena_winner, second_evicted);
        write_cycle!(flat, record.cycles.get(2), third_hoh_winner, third_nominees,
            third_pov_winner, third_pov_used, third_pov_used_on, third_replacement_nominee,
            third_ai_arena_enabled, third_ai_arena_winner, third_evicted);

        if let Some(ballot) = &record.finale {
            flat.final_hoh_winner = ballot.final_hoh_winner;
            flat.winner = ballot.winner;
            flat.runner_up = ballot.runner_up;
            flat.americas_favorite = ballot.americas_favorite;
        }

        flat
    }
}

impl TryFrom<LegacyWeekRecord> for WeekEventRecord {
    type Error = LegacyShapeError;

    fn try_from(flat: LegacyWeekRecord) -> Result<Self, Self::Error> {
        let variant = WeekVariant::from_flags(
            flat.is_double_eviction,
            flat.is_triple_eviction,
            flat.is_final_week,
        )
        .ok_or(LegacyShapeError::ConflictingVariantFlags {
            week: flat.week_number,
        })?;

        let all_cycles = [
            read_cycle!(flat, hoh_winner, nominees, pov_winner, pov_used, pov_used_on,
                replacement_nominee, ai_arena_enabled, ai_arena_winner, evicted),
            read_cycle!(flat, second_hoh_winner, second_nominees, second_pov_winner,
                second_pov_used, second_pov_used_on, second_replacement_nominee,
                second_ai_arena_enabled, second_ai_arena_winner, second_evicted),
            read_cycle!(flat, third_hoh_winner, third_nominees, third_pov_winner,
                third_pov_used, third_pov_used_on, third_replacement_nominee,
                third_ai_arena_enabled, third_ai_arena_winner, third_evicted),
        ];
        let cycles: Vec<EvictionCycle> = all_cycles
            .into_iter()
            .take(variant.cycle_count())
            .collect();

        let finale = (variant == WeekVariant::Final).then(|| FinalBallot {
            final_hoh_winner: flat.final_hoh_winner,
            winner: flat.winner,
            runner_up: flat.runner_up,
            americas_favorite: flat.americas_favorite,
        });

        Ok(Self {
            pool_id: flat.pool_id,
            week_number: flat.week_number,
            variant,
            is_draft: flat.is_draft,
            is_complete: flat.is_complete,
            is_jury_phase: flat.is_jury_phase,
            cycles,
            finale,
            revision: flat.revision,
            updated_at: flat.updated_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn double_eviction_uses_second_group() {
        let (eve, finn) = (ContestantId::new(), ContestantId::new());
        let mut record = WeekEventRecord::new(PoolId::new(), 7, WeekVariant::DoubleEviction);
        record.cycles[0].evicted = Some(EvictionOutcome::Evicted(eve));
        record.cycles[1].evicted = Some(EvictionOutcome::Evicted(finn));

        let flat = LegacyWeekRecord::from(&record);
        assert!(flat.is_double_eviction);
        assert_eq!(flat.evicted, Some(eve.to_string()));
        assert_eq!(flat.second_evicted, Some(finn.to_string()));
        assert_eq!(flat.third_evicted, None);

        let restored = WeekEventRecord::try_from(flat).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn sentinel_decodes_to_no_eviction() {
        let flat = LegacyWeekRecord {
            week_number: 2,
            evicted: Some(NO_EVICTION.to_owned()),
            ..LegacyWeekRecord::default()
        };
        let record = WeekEventRecord::try_from(flat).unwrap();
        assert_eq!(record.cycles[0].evicted, Some(EvictionOutcome::NoEviction));
    }

    #[test]
    fn garbage_evicted_is_rejected() {
        let flat = LegacyWeekRecord {
            week_number: 2,
            evicted: Some("Cara".to_owned()),
            ..LegacyWeekRecord::default()
        };
        assert!(matches!(
            WeekEventRecord::try_from(flat),
            Err(LegacyShapeError::InvalidEvicted { week: 2, .. })
        ));
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        let flat = LegacyWeekRecord {
            week_number: 9,
            is_double_eviction: true,
            is_final_week: true,
            ..LegacyWeekRecord::default()
        };
        assert_eq!(
            WeekEventRecord::try_from(flat),
            Err(LegacyShapeError::ConflictingVariantFlags { week: 9 })
        );
    }

    #[test]
    fn regular_week_ignores_stale_second_group() {
        let flat = LegacyWeekRecord {
            week_number: 4,
            second_hoh_winner: Some(ContestantId::new()),
            ..LegacyWeekRecord::default()
        };
        let record = WeekEventRecord::try_from(flat).unwrap();
        assert_eq!(record.cycles.len(), 1);
        assert!(record.cycles[0].is_blank());
    }
}
