//! Ceremony step derivation.
//!
//! ```text
//! AwaitingHoh -> AwaitingNominees -> AwaitingVeto -> AwaitingVetoDecision
//!     -> [AwaitingReplacement] -> [AwaitingArena] -> AwaitingEviction -> Complete
//! ```
//!
//! `AwaitingReplacement` applies only when the veto was used;
//! `AwaitingArena` only when the Arena is enabled and at least three
//! nominees remain on the block after the veto meeting.

use eviction_types::{CeremonyStep, EvictionCycle, FinalBallot};

use crate::issues::BallotField;

/// Minimum nominees for the nominations step to count as recorded.
pub const MIN_NOMINEES: usize = 2;

/// Every unmet step of `cycle`, in ceremony order.
///
/// Later steps are reported even when earlier ones are missing, so a
/// submit error can name all of them at once.
pub fn missing_steps(cycle: &EvictionCycle) -> Vec<CeremonyStep> {
    let mut missing = Vec::new();
    if cycle.hoh_winner.is_none() {
        missing.push(CeremonyStep::AwaitingHoh);
    }
    if cycle.nominees.len() < MIN_NOMINEES {
        missing.push(CeremonyStep::AwaitingNominees);
    }
    if cycle.pov_winner.is_none() {
        missing.push(CeremonyStep::AwaitingVeto);
    }
    let decision_open = match cycle.pov_used {
        None => true,
        Some(used) => used && cycle.pov_used_on.is_none(),
    };
    if decision_open {
        missing.push(CeremonyStep::AwaitingVetoDecision);
    }
    if cycle.veto_used() && cycle.replacement_nominee.is_none() {
        missing.push(CeremonyStep::AwaitingReplacement);
    }
    if cycle.arena_applies() && cycle.ai_arena_winner.is_none() {
        missing.push(CeremonyStep::AwaitingArena);
    }
    if cycle.evicted.is_none() {
        missing.push(CeremonyStep::AwaitingEviction);
    }
    missing
}

/// The step `cycle` is at: its first unmet step, or `Complete`.
pub fn current_step(cycle: &EvictionCycle) -> CeremonyStep {
    missing_steps(cycle)
        .first()
        .copied()
        .unwrap_or(CeremonyStep::Complete)
}

/// Steps that apply to `cycle` given the current field values.
pub fn applicable_steps(cycle: &EvictionCycle) -> Vec<CeremonyStep> {
    let mut steps = vec![
        CeremonyStep::AwaitingHoh,
        CeremonyStep::AwaitingNominees,
        CeremonyStep::AwaitingVeto,
        CeremonyStep::AwaitingVetoDecision,
    ];
    if cycle.veto_used() {
        steps.push(CeremonyStep::AwaitingReplacement);
    }
    if cycle.arena_applies() {
        steps.push(CeremonyStep::AwaitingArena);
    }
    steps.push(CeremonyStep::AwaitingEviction);
    steps
}

/// Required finale ballot fields that are still empty.
///
/// The final HOH winner is recorded when known but is not required.
pub fn missing_ballot_fields(ballot: &FinalBallot) -> Vec<BallotField> {
    [
        (BallotField::Winner, ballot.winner),
        (BallotField::RunnerUp, ballot.runner_up),
        (BallotField::AmericasFavorite, ballot.americas_favorite),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.is_none().then_some(field))
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eviction_types::{ContestantId, EvictionOutcome};

    use super::*;

    fn ids<const N: usize>() -> [ContestantId; N] {
        core::array::from_fn(|_| ContestantId::new())
    }

    #[test]
    fn blank_cycle_awaits_hoh() {
        let cycle = EvictionCycle::default();
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingHoh);
        assert_eq!(
            missing_steps(&cycle),
            vec![
                CeremonyStep::AwaitingHoh,
                CeremonyStep::AwaitingNominees,
                CeremonyStep::AwaitingVeto,
                CeremonyStep::AwaitingVetoDecision,
                CeremonyStep::AwaitingEviction,
            ]
        );
    }

    #[test]
    fn steps_advance_as_fields_fill() {
        let [hoh, a, b, c] = ids();
        let mut cycle = EvictionCycle {
            hoh_winner: Some(hoh),
            ..EvictionCycle::default()
        };
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingNominees);

        cycle.nominees = vec![a, b];
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingVeto);

        cycle.pov_winner = Some(a);
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingVetoDecision);

        cycle.pov_used = Some(true);
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingVetoDecision);

        cycle.pov_used_on = Some(a);
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingReplacement);

        cycle.replacement_nominee = Some(c);
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingEviction);

        cycle.evicted = Some(EvictionOutcome::Evicted(b));
        assert_eq!(current_step(&cycle), CeremonyStep::Complete);
    }

    #[test]
    fn unused_veto_skips_replacement() {
        let [hoh, a, b] = ids();
        let cycle = EvictionCycle {
            hoh_winner: Some(hoh),
            nominees: vec![a, b],
            pov_winner: Some(hoh),
            pov_used: Some(false),
            ..EvictionCycle::default()
        };
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingEviction);
        assert!(!applicable_steps(&cycle).contains(&CeremonyStep::AwaitingReplacement));
    }

    #[test]
    fn arena_applies_only_with_three_nominees() {
        let [hoh, a, b, c] = ids();
        let mut cycle = EvictionCycle {
            hoh_winner: Some(hoh),
            nominees: vec![a, b],
            pov_winner: Some(hoh),
            pov_used: Some(false),
            ai_arena_enabled: true,
            ..EvictionCycle::default()
        };
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingEviction);

        cycle.nominees.push(c);
        assert_eq!(current_step(&cycle), CeremonyStep::AwaitingArena);
    }

    #[test]
    fn ballot_requires_placements_but_not_final_hoh() {
        let [w, r] = ids();
        let ballot = FinalBallot {
            winner: Some(w),
            runner_up: Some(r),
            ..FinalBallot::default()
        };
        assert_eq!(missing_ballot_fields(&ballot), vec![BallotField::AmericasFavorite]);
    }
}
