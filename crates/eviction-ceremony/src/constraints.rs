//! Write-time structural constraints.
//!
//! A constraint violation is a contradiction no later edit of another
//! field could fix, so it is rejected on every write, drafts included,
//! and nothing is persisted.

use std::collections::BTreeSet;

use eviction_scoring::events::{references_pool_rule, resolve_subcategory};
use eviction_types::{
    ContestantId, EvictionCycle, SpecialEvent, SpecialEventId, WeekEventRecord, WeekVariant,
};
use serde::Serialize;

use crate::validation::CeremonyContext;

/// A structural contradiction in a week record or its special events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum ConstraintViolation {
    /// Week numbers start at 1.
    #[error("week number must be at least 1, got {week}")]
    InvalidWeekNumber {
        /// The rejected week number.
        week: u32,
    },

    /// The number of cycles does not match the week variant.
    #[error("{variant:?} week needs {expected} eviction cycle(s), got {actual}")]
    CycleCountMismatch {
        /// The week variant.
        variant: WeekVariant,
        /// Cycles the variant requires.
        expected: usize,
        /// Cycles present.
        actual: usize,
    },

    /// A finale ballot on a non-final week, or none on the final week.
    #[error("finale ballot does not match {variant:?} week")]
    FinaleMismatch {
        /// The week variant.
        variant: WeekVariant,
    },

    /// A named contestant is not on the pool's roster.
    #[error("contestant {contestant_id} is not on the roster")]
    UnknownContestant {
        /// The unknown contestant.
        contestant_id: ContestantId,
    },

    /// The HOH winner is among the nominees.
    #[error("cycle {cycle}: HOH {contestant_id} cannot be nominated")]
    HohNominated {
        /// Cycle index.
        cycle: usize,
        /// The HOH.
        contestant_id: ContestantId,
    },

    /// A contestant is nominated twice.
    #[error("cycle {cycle}: {contestant_id} nominated more than once")]
    DuplicateNominee {
        /// Cycle index.
        cycle: usize,
        /// The repeated nominee.
        contestant_id: ContestantId,
    },

    /// More nominees than the pool allows.
    #[error("cycle {cycle}: {count} nominees exceeds the pool maximum of {max}")]
    TooManyNominees {
        /// Cycle index.
        cycle: usize,
        /// Nominees recorded.
        count: usize,
        /// The pool's `max_nominees`.
        max: u32,
    },

    /// The replacement nominee is the HOH, the veto holder, the saved
    /// nominee, or already nominated.
    #[error("cycle {cycle}: replacement {contestant_id} overlaps the HOH, veto, or nominees")]
    ReplacementOverlap {
        /// Cycle index.
        cycle: usize,
        /// The replacement.
        contestant_id: ContestantId,
    },

    /// The finale names the same contestant winner and runner-up.
    #[error("{contestant_id} cannot be both winner and runner-up")]
    RunnerUpIsWinner {
        /// The doubly-named contestant.
        contestant_id: ContestantId,
    },

    /// Another week already starts the jury phase.
    #[error("week {week} cannot start the jury phase; week {claimed_by} already does")]
    JuryPhaseTaken {
        /// The week being written.
        week: u32,
        /// The week that holds the flag.
        claimed_by: u32,
    },

    /// A special event belongs to another pool or week.
    #[error("special event {event_id} does not belong to this week")]
    SpecialEventMisplaced {
        /// The event.
        event_id: SpecialEventId,
    },

    /// A special event's type is not enabled for the pool. Types backed by a
    /// pool-defined special rule (`rule:<uuid>`) are always enabled.
    #[error("special event type {event_type:?} is not enabled for this pool")]
    SpecialEventNotEnabled {
        /// The event.
        event_id: SpecialEventId,
        /// The resolved type.
        event_type: String,
    },

    /// A special event references a rule that does not exist.
    #[error("special event {event_id} references unknown rule {reference:?}")]
    UnknownRuleReference {
        /// The event.
        event_id: SpecialEventId,
        /// The stored reference.
        reference: String,
    },
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn check_shape(record: &WeekEventRecord, out: &mut Vec<ConstraintViolation>) {
    if record.week_number == 0 {
        out.push(ConstraintViolation::InvalidWeekNumber { week: 0 });
    }
    let expected = record.variant.cycle_count();
    if record.cycles.len() != expected {
        out.push(ConstraintViolation::CycleCountMismatch {
            variant: record.variant,
            expected,
            actual: record.cycles.len(),
        });
    }
    if record.finale.is_some() != (record.variant == WeekVariant::Final) {
        out.push(ConstraintViolation::FinaleMismatch {
            variant: record.variant,
        });
    }
}

fn check_cycle(
    ctx: &CeremonyContext<'_>,
    index: usize,
    cycle: &EvictionCycle,
    out: &mut Vec<ConstraintViolation>,
) {
    if let Some(hoh) = cycle.hoh_winner {
        if cycle.nominees.contains(&hoh) {
            out.push(ConstraintViolation::HohNominated {
                cycle: index,
                contestant_id: hoh,
            });
        }
    }

    let mut seen = BTreeSet::new();
    for nominee in &cycle.nominees {
        if !seen.insert(*nominee) {
            out.push(ConstraintViolation::DuplicateNominee {
                cycle: index,
                contestant_id: *nominee,
            });
        }
    }

    let max = ctx.settings.max_nominees;
    if u32::try_from(cycle.nominees.len()).unwrap_or(u32::MAX) > max {
        out.push(ConstraintViolation::TooManyNominees {
            cycle: index,
            count: cycle.nominees.len(),
            max,
        });
    }

    if let Some(replacement) = cycle.replacement_nominee {
        let overlaps = [cycle.hoh_winner, cycle.pov_winner, cycle.pov_used_on]
            .into_iter()
            .flatten()
            .chain(cycle.nominees.iter().copied())
            .any(|id| id == replacement);
        if overlaps {
            out.push(ConstraintViolation::ReplacementOverlap {
                cycle: index,
                contestant_id: replacement,
            });
        }
    }
}

fn check_special_events(
    ctx: &CeremonyContext<'_>,
    record: &WeekEventRecord,
    events: &[SpecialEvent],
    out: &mut Vec<ConstraintViolation>,
) {
    for event in events {
        if event.pool_id != record.pool_id || event.week_number != record.week_number {
            out.push(ConstraintViolation::SpecialEventMisplaced { event_id: event.id });
            continue;
        }
        if !ctx.roster.is_on_roster(event.contestant_id) {
            out.push(ConstraintViolation::UnknownContestant {
                contestant_id: event.contestant_id,
            });
        }
        match resolve_subcategory(&event.event_type, ctx.rules) {
            Ok(event_type) => {
                if !ctx.settings.enabled_special_events.contains(&event_type)
                    && !references_pool_rule(&event.event_type, ctx.rules)
                {
                    out.push(ConstraintViolation::SpecialEventNotEnabled {
                        event_id: event.id,
                        event_type,
                    });
                }
            }
            Err(_) => out.push(ConstraintViolation::UnknownRuleReference {
                event_id: event.id,
                reference: event.event_type.clone(),
            }),
        }
    }
}

/// Every constraint violation in `record` and the special events that
/// would be written with it.
pub fn constraint_violations(
    ctx: &CeremonyContext<'_>,
    record: &WeekEventRecord,
    events: &[SpecialEvent],
) -> Vec<ConstraintViolation> {
    let mut out = Vec::new();
    check_shape(record, &mut out);

    for contestant_id in record.named_contestants() {
        if !ctx.roster.is_on_roster(contestant_id) {
            out.push(ConstraintViolation::UnknownContestant { contestant_id });
        }
    }

    for (index, cycle) in record.cycles.iter().enumerate() {
        check_cycle(ctx, index, cycle, &mut out);
    }

    if let Some(ballot) = &record.finale {
        if let (Some(winner), Some(runner_up)) = (ballot.winner, ballot.runner_up) {
            if winner == runner_up {
                out.push(ConstraintViolation::RunnerUpIsWinner {
                    contestant_id: winner,
                });
            }
        }
    }

    if record.is_jury_phase {
        if let Some(claimed_by) = ctx.jury_phase_week.filter(|w| *w != record.week_number) {
            out.push(ConstraintViolation::JuryPhaseTaken {
                week: record.week_number,
                claimed_by,
            });
        }
    }

    check_special_events(ctx, record, events, &mut out);
    out
}

/// Reject a write that violates any structural constraint.
///
/// # Errors
///
/// Returns the first [`ConstraintViolation`] found.
pub fn check_constraints(
    ctx: &CeremonyContext<'_>,
    record: &WeekEventRecord,
    events: &[SpecialEvent],
) -> Result<(), ConstraintViolation> {
    match constraint_violations(ctx, record, events).into_iter().next() {
        None => Ok(()),
        Some(violation) => {
            tracing::warn!(
                pool_id = %record.pool_id,
                week = record.week_number,
                %violation,
                "Write rejected"
            );
            Err(violation)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use eviction_scoring::defaults::default_rules;
    use eviction_scoring::{RosterResolver, ScoringRuleTable};
    use eviction_types::subcategory::SELF_EVICTED;
    use eviction_types::{
        Contestant, FinalBallot, PoolId, PoolSettings, ScoringCategory, ScoringRule,
    };

    use super::*;

    struct Fixture {
        pool: PoolId,
        cast: Vec<Contestant>,
        settings: PoolSettings,
        rules: ScoringRuleTable,
        roster: RosterResolver,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_rules(default_rules())
        }

        fn with_rules(rules: Vec<ScoringRule>) -> Self {
            let pool = PoolId::new();
            let cast: Vec<Contestant> = (0..6)
                .map(|i| Contestant {
                    id: ContestantId::new(),
                    name: format!("Houseguest {i}"),
                    pool_id: pool,
                    is_active: true,
                    final_placement: None,
                })
                .collect();
            let roster = RosterResolver::new(&cast, &[], &[]);
            Self {
                pool,
                cast,
                settings: PoolSettings::default(),
                rules: ScoringRuleTable::new(pool, rules),
                roster,
            }
        }

        fn id(&self, i: usize) -> ContestantId {
            self.cast[i].id
        }

        fn ctx(&self, jury_phase_week: Option<u32>) -> CeremonyContext<'_> {
            CeremonyContext {
                settings: &self.settings,
                roster: &self.roster,
                rules: &self.rules,
                jury_phase_week,
            }
        }

        fn event(&self, week: u32, event_type: &str) -> SpecialEvent {
            SpecialEvent {
                id: SpecialEventId::new(),
                pool_id: self.pool,
                contestant_id: self.id(5),
                week_number: week,
                event_type: event_type.to_owned(),
                points_awarded: -10,
                description: String::new(),
            }
        }
    }

    #[test]
    fn hoh_cannot_be_nominated() {
        let f = Fixture::new();
        let mut record = WeekEventRecord::new(f.pool, 1, WeekVariant::Regular);
        record.cycles[0].hoh_winner = Some(f.id(0));
        record.cycles[0].nominees = vec![f.id(0), f.id(1)];
        assert_eq!(
            check_constraints(&f.ctx(None), &record, &[]),
            Err(ConstraintViolation::HohNominated {
                cycle: 0,
                contestant_id: f.id(0),
            })
        );
    }

    #[test]
    fn replacement_must_be_disjoint() {
        let f = Fixture::new();
        let mut record = WeekEventRecord::new(f.pool, 1, WeekVariant::Regular);
        let cycle = &mut record.cycles[0];
        cycle.hoh_winner = Some(f.id(0));
        cycle.nominees = vec![f.id(1), f.id(2)];
        cycle.pov_winner = Some(f.id(3));
        cycle.pov_used = Some(true);
        cycle.pov_used_on = Some(f.id(1));

        for overlapping in [f.id(0), f.id(1), f.id(2), f.id(3)] {
            record.cycles[0].replacement_nominee = Some(overlapping);
            let violations = constraint_violations(&f.ctx(None), &record, &[]);
            assert_eq!(
                violations,
                vec![ConstraintViolation::ReplacementOverlap {
                    cycle: 0,
                    contestant_id: overlapping,
                }]
            );
        }

        record.cycles[0].replacement_nominee = Some(f.id(4));
        assert!(check_constraints(&f.ctx(None), &record, &[]).is_ok());
    }

    #[test]
    fn nominee_list_is_bounded_and_unique() {
        let f = Fixture::new();
        let mut record = WeekEventRecord::new(f.pool, 1, WeekVariant::Regular);
        record.cycles[0].nominees = vec![f.id(1), f.id(1)];
        assert!(matches!(
            check_constraints(&f.ctx(None), &record, &[]),
            Err(ConstraintViolation::DuplicateNominee { .. })
        ));

        record.cycles[0].nominees = vec![f.id(1), f.id(2), f.id(3), f.id(4)];
        assert_eq!(
            check_constraints(&f.ctx(None), &record, &[]),
            Err(ConstraintViolation::TooManyNominees {
                cycle: 0,
                count: 4,
                max: 3,
            })
        );
    }

    #[test]
    fn second_jury_week_is_rejected() {
        let f = Fixture::new();
        let mut record = WeekEventRecord::new(f.pool, 7, WeekVariant::Regular);
        record.is_jury_phase = true;
        assert_eq!(
            check_constraints(&f.ctx(Some(5)), &record, &[]),
            Err(ConstraintViolation::JuryPhaseTaken {
                week: 7,
                claimed_by: 5,
            })
        );
        assert!(check_constraints(&f.ctx(Some(7)), &record, &[]).is_ok());
        assert!(check_constraints(&f.ctx(None), &record, &[]).is_ok());
    }

    #[test]
    fn runner_up_must_differ_from_winner() {
        let f = Fixture::new();
        let mut record = WeekEventRecord::new(f.pool, 10, WeekVariant::Final);
        record.finale = Some(FinalBallot {
            winner: Some(f.id(0)),
            runner_up: Some(f.id(0)),
            ..FinalBallot::default()
        });
        assert_eq!(
            check_constraints(&f.ctx(None), &record, &[]),
            Err(ConstraintViolation::RunnerUpIsWinner {
                contestant_id: f.id(0),
            })
        );
    }

    #[test]
    fn shape_must_match_variant() {
        let f = Fixture::new();
        let mut record = WeekEventRecord::new(f.pool, 0, WeekVariant::Regular);
        record.cycles.clear();
        let violations = constraint_violations(&f.ctx(None), &record, &[]);
        assert!(violations.contains(&ConstraintViolation::InvalidWeekNumber { week: 0 }));
        assert!(violations.contains(&ConstraintViolation::CycleCountMismatch {
            variant: WeekVariant::Regular,
            expected: 1,
            actual: 0,
        }));
    }

    #[test]
    fn strangers_are_rejected() {
        let f = Fixture::new();
        let stranger = ContestantId::new();
        let mut record = WeekEventRecord::new(f.pool, 1, WeekVariant::Regular);
        record.cycles[0].hoh_winner = Some(stranger);
        assert_eq!(
            check_constraints(&f.ctx(None), &record, &[]),
            Err(ConstraintViolation::UnknownContestant {
                contestant_id: stranger,
            })
        );
    }

    #[test]
    fn special_events_must_be_enabled_and_in_week() {
        let mut f = Fixture::new();
        let record = WeekEventRecord::new(f.pool, 5, WeekVariant::Regular);

        assert!(check_constraints(&f.ctx(None), &record, &[f.event(5, SELF_EVICTED)]).is_ok());
        assert!(matches!(
            check_constraints(&f.ctx(None), &record, &[f.event(4, SELF_EVICTED)]),
            Err(ConstraintViolation::SpecialEventMisplaced { .. })
        ));

        f.settings.enabled_special_events.retain(|t| t != SELF_EVICTED);
        assert!(matches!(
            check_constraints(&f.ctx(None), &record, &[f.event(5, SELF_EVICTED)]),
            Err(ConstraintViolation::SpecialEventNotEnabled { .. })
        ));
    }

    #[test]
    fn pool_defined_special_rules_need_no_enabling() {
        let mut f = Fixture::new();
        let mut custom = ScoringRule::default_rule(ScoringCategory::Special, "showmance", 3);
        custom.pool_id = Some(f.pool);
        let reference = format!("rule:{}", custom.id);
        f.rules = ScoringRuleTable::new(f.pool, vec![custom]);
        let record = WeekEventRecord::new(f.pool, 5, WeekVariant::Regular);

        assert!(check_constraints(&f.ctx(None), &record, &[f.event(5, &reference)]).is_ok());
        assert!(matches!(
            check_constraints(&f.ctx(None), &record, &[f.event(5, "showmance")]),
            Err(ConstraintViolation::SpecialEventNotEnabled { .. })
        ));
    }

    #[test]
    fn rule_references_resolve_before_the_enabled_check() {
        let pool_rule = ScoringRule::default_rule(ScoringCategory::Special, SELF_EVICTED, -15);
        let reference = format!("rule:{}", pool_rule.id);
        let f = Fixture::with_rules(vec![pool_rule]);
        let record = WeekEventRecord::new(f.pool, 5, WeekVariant::Regular);

        assert!(check_constraints(&f.ctx(None), &record, &[f.event(5, &reference)]).is_ok());
        let dangling = format!("rule:{}", eviction_types::ScoringRuleId::new());
        assert!(matches!(
            check_constraints(&f.ctx(None), &record, &[f.event(5, &dangling)]),
            Err(ConstraintViolation::UnknownRuleReference { .. })
        ));
    }
}
