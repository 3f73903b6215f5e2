//! Step and transition validators.
//!
//! Validation runs in stages, each contributing [`StepIssue`]s:
//!
//! 1. Steps -- which applicable steps are still unrecorded?
//! 2. Eligibility -- is every named contestant in the game for the cycle?
//! 3. Transitions -- is each recorded value legal given the earlier steps
//!    (veto target on the block, Arena winner a final nominee, evictee a
//!    legal candidate)?
//!
//! Every stage runs even when an earlier one found problems, so the
//! result names everything that blocks submission.

use std::collections::BTreeSet;

use eviction_scoring::{RosterResolver, ScoringRuleTable};
use eviction_types::{
    ContestantId, EvictionCycle, FinalBallot, PoolSettings, StatusReason, WeekEventRecord,
};

use crate::issues::{IncompleteWeekError, Role, StepIssue};
use crate::steps::{missing_ballot_fields, missing_steps};

/// Everything the validators need besides the record itself.
///
/// Assembled by the lifecycle manager from the store.
#[derive(Debug, Clone, Copy)]
pub struct CeremonyContext<'a> {
    /// The pool's settings.
    pub settings: &'a PoolSettings,
    /// Roster status built from the committed event log.
    pub roster: &'a RosterResolver,
    /// The pool's rule table, for resolving special event types.
    pub rules: &'a ScoringRuleTable,
    /// The week that already claims the jury phase, if any, excluding the
    /// week being written.
    pub jury_phase_week: Option<u32>,
}

impl CeremonyContext<'_> {
    /// Why `contestant_id` may not play a part in `week`, if they may not.
    ///
    /// A contestant is eligible when active entering the week, or when a
    /// return event brings them back in that same week.
    pub fn ineligibility(&self, contestant_id: ContestantId, week: u32) -> Option<StatusReason> {
        let entering = self.roster.status_entering_week(contestant_id, week);
        if entering.active {
            return None;
        }
        let during = self.roster.status_as_of_week(contestant_id, week);
        match during.reason {
            StatusReason::Returned { week: returned } if returned == week => None,
            _ => Some(entering.reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle validation
// ---------------------------------------------------------------------------

fn check_eligible(
    ctx: &CeremonyContext<'_>,
    week: u32,
    cycle: Option<usize>,
    role: Role,
    contestant_id: ContestantId,
    gone_this_week: &BTreeSet<ContestantId>,
    issues: &mut Vec<StepIssue>,
) {
    let reason = if gone_this_week.contains(&contestant_id) {
        Some(StatusReason::Evicted { week })
    } else {
        ctx.ineligibility(contestant_id, week)
    };
    if let Some(reason) = reason {
        issues.push(StepIssue::Ineligible {
            cycle,
            role,
            contestant_id,
            reason,
        });
    }
}

fn validate_cycle(
    ctx: &CeremonyContext<'_>,
    week: u32,
    index: usize,
    cycle: &EvictionCycle,
    gone_this_week: &BTreeSet<ContestantId>,
    issues: &mut Vec<StepIssue>,
) {
    // Stage 1: steps
    issues.extend(missing_steps(cycle).into_iter().map(|step| StepIssue::MissingStep {
        cycle: Some(index),
        step,
    }));

    // Stage 2: eligibility
    let at = Some(index);
    let mut named: Vec<(Role, ContestantId)> = Vec::new();
    named.extend(cycle.hoh_winner.map(|id| (Role::Hoh, id)));
    named.extend(cycle.nominees.iter().map(|id| (Role::Nominee, *id)));
    named.extend(cycle.pov_winner.map(|id| (Role::PovWinner, id)));
    named.extend(cycle.replacement_nominee.map(|id| (Role::Replacement, id)));
    named.extend(cycle.ai_arena_winner.map(|id| (Role::ArenaWinner, id)));
    for (role, id) in named {
        check_eligible(ctx, week, at, role, id, gone_this_week, issues);
    }

    // Stage 3: transitions
    match (cycle.pov_used, cycle.pov_used_on) {
        (Some(true), Some(target)) if !cycle.nominees.contains(&target) => {
            issues.push(StepIssue::VetoTargetNotNominee {
                cycle: index,
                contestant_id: target,
            });
        }
        (Some(false), Some(_)) => {
            issues.push(StepIssue::VetoTargetWithoutUse { cycle: index });
        }
        _ => {}
    }
    if cycle.replacement_nominee.is_some() && cycle.pov_used == Some(false) {
        issues.push(StepIssue::ReplacementWithoutVeto { cycle: index });
    }

    if let Some(arena_winner) = cycle.ai_arena_winner {
        if !cycle.arena_applies() {
            issues.push(StepIssue::ArenaNotApplicable { cycle: index });
        } else if !cycle.final_nominees().contains(&arena_winner) {
            issues.push(StepIssue::ArenaWinnerNotNominee {
                cycle: index,
                contestant_id: arena_winner,
            });
        }
    }

    if let Some(evicted) = cycle.evicted_contestant() {
        if !cycle.eviction_candidates().contains(&evicted) {
            issues.push(StepIssue::EvictedNotCandidate {
                cycle: index,
                contestant_id: evicted,
            });
        }
    }
}

fn validate_finale(
    ctx: &CeremonyContext<'_>,
    week: u32,
    ballot: &FinalBallot,
    issues: &mut Vec<StepIssue>,
) {
    issues.extend(
        missing_ballot_fields(ballot)
            .into_iter()
            .map(|field| StepIssue::MissingBallotField { field }),
    );

    let none = BTreeSet::new();
    let named = [
        (Role::FinalHohWinner, ballot.final_hoh_winner),
        (Role::Winner, ballot.winner),
        (Role::RunnerUp, ballot.runner_up),
    ];
    for (role, id) in named {
        if let Some(id) = id {
            check_eligible(ctx, week, None, role, id, &none, issues);
        }
    }
}

/// Every unmet step and illegal transition in `record`.
///
/// Advisory: an empty list means the week may be submitted. Within a
/// multi-cycle week, a contestant evicted in an earlier cycle is out of
/// the game for the later ones.
pub fn validate_week(ctx: &CeremonyContext<'_>, record: &WeekEventRecord) -> Vec<StepIssue> {
    let week = record.week_number;
    let mut issues = Vec::new();
    let mut gone_this_week = BTreeSet::new();

    for (index, cycle) in record.cycles.iter().enumerate() {
        validate_cycle(ctx, week, index, cycle, &gone_this_week, &mut issues);
        gone_this_week.extend(cycle.evicted_contestant());
    }
    if let Some(ballot) = &record.finale {
        validate_finale(ctx, week, ballot, &mut issues);
    }
    issues
}

/// Hard precondition for submit.
///
/// # Errors
///
/// Returns [`IncompleteWeekError`] naming every issue [`validate_week`]
/// finds.
pub fn validate_for_submit(
    ctx: &CeremonyContext<'_>,
    record: &WeekEventRecord,
) -> Result<(), IncompleteWeekError> {
    let issues = validate_week(ctx, record);
    if issues.is_empty() {
        return Ok(());
    }
    tracing::info!(
        pool_id = %record.pool_id,
        week = record.week_number,
        issues = issues.len(),
        "Submit refused, week incomplete"
    );
    Err(IncompleteWeekError {
        pool_id: record.pool_id,
        week: record.week_number,
        issues,
    })
}
