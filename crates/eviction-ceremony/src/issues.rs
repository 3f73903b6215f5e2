//! Advisory step issues and the submit-time error that collects them.

use eviction_types::{CeremonyStep, ContestantId, PoolId, StatusReason};
use serde::Serialize;

/// The part a contestant plays in a cycle or on the finale ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Head of Household.
    Hoh,
    /// Initial nominee.
    Nominee,
    /// Power of Veto winner.
    PovWinner,
    /// Replacement nominee.
    Replacement,
    /// Arena winner.
    ArenaWinner,
    /// Final HOH winner.
    FinalHohWinner,
    /// Season winner.
    Winner,
    /// Season runner-up.
    RunnerUp,
}

impl Role {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hoh => "hoh_winner",
            Self::Nominee => "nominee",
            Self::PovWinner => "pov_winner",
            Self::Replacement => "replacement_nominee",
            Self::ArenaWinner => "ai_arena_winner",
            Self::FinalHohWinner => "final_hoh_winner",
            Self::Winner => "winner",
            Self::RunnerUp => "runner_up",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field of the finale ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotField {
    /// Final HOH winner. Optional for submission.
    FinalHohWinner,
    /// Season winner.
    Winner,
    /// Season runner-up.
    RunnerUp,
    /// Fan-vote winner.
    AmericasFavorite,
}

impl BallotField {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FinalHohWinner => "final_hoh_winner",
            Self::Winner => "winner",
            Self::RunnerUp => "runner_up",
            Self::AmericasFavorite => "americas_favorite",
        }
    }
}

impl core::fmt::Display for BallotField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unmet step or illegal transition in a week record.
///
/// `cycle` is the 0-based eviction cycle index; `None` refers to the
/// finale ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum StepIssue {
    /// A required ceremony step has no value yet.
    #[error("cycle {}: {} not recorded", cycle_label(*cycle), step.label())]
    MissingStep {
        /// Cycle index.
        cycle: Option<usize>,
        /// The unmet step.
        step: CeremonyStep,
    },

    /// A required finale ballot field is empty.
    #[error("finale: {field} not recorded")]
    MissingBallotField {
        /// The empty field.
        field: BallotField,
    },

    /// A contestant named in a role was not in the game for the cycle.
    #[error(
        "cycle {}: {contestant_id} cannot be {role}, not in the game ({reason:?})",
        cycle_label(*cycle)
    )]
    Ineligible {
        /// Cycle index.
        cycle: Option<usize>,
        /// The role the contestant was named in.
        role: Role,
        /// The contestant.
        contestant_id: ContestantId,
        /// Why they are out.
        reason: StatusReason,
    },

    /// The veto was used on someone who was not nominated.
    #[error("cycle {cycle}: veto used on {contestant_id}, who is not a nominee")]
    VetoTargetNotNominee {
        /// Cycle index.
        cycle: usize,
        /// The named target.
        contestant_id: ContestantId,
    },

    /// A veto target is named although the veto was not used.
    #[error("cycle {cycle}: veto target named but the veto was not used")]
    VetoTargetWithoutUse {
        /// Cycle index.
        cycle: usize,
    },

    /// A replacement nominee is named although the veto was not used.
    #[error("cycle {cycle}: replacement named but the veto was not used")]
    ReplacementWithoutVeto {
        /// Cycle index.
        cycle: usize,
    },

    /// An Arena winner is recorded for a cycle where the Arena does not
    /// apply.
    #[error("cycle {cycle}: Arena winner recorded but the Arena does not apply")]
    ArenaNotApplicable {
        /// Cycle index.
        cycle: usize,
    },

    /// The Arena winner is not on the final block.
    #[error("cycle {cycle}: Arena winner {contestant_id} is not a final nominee")]
    ArenaWinnerNotNominee {
        /// Cycle index.
        cycle: usize,
        /// The named winner.
        contestant_id: ContestantId,
    },

    /// The evicted contestant is not a legal eviction candidate.
    #[error("cycle {cycle}: {contestant_id} is not an eviction candidate")]
    EvictedNotCandidate {
        /// Cycle index.
        cycle: usize,
        /// The named evictee.
        contestant_id: ContestantId,
    },
}

impl StepIssue {
    /// The cycle the issue belongs to; `None` for the finale.
    pub const fn cycle(&self) -> Option<usize> {
        match self {
            Self::MissingStep { cycle, .. } | Self::Ineligible { cycle, .. } => *cycle,
            Self::MissingBallotField { .. } => None,
            Self::VetoTargetNotNominee { cycle, .. }
            | Self::VetoTargetWithoutUse { cycle }
            | Self::ReplacementWithoutVeto { cycle }
            | Self::ArenaNotApplicable { cycle }
            | Self::ArenaWinnerNotNominee { cycle, .. }
            | Self::EvictedNotCandidate { cycle, .. } => Some(*cycle),
        }
    }
}

fn cycle_label(cycle: Option<usize>) -> String {
    cycle.map_or_else(|| "finale".to_owned(), |c| c.saturating_add(1).to_string())
}

/// Submit refused: the week has unmet steps.
///
/// Lists every issue found, not only the first, so the editor can show
/// them all at once. Nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("week {week} cannot be submitted: {} unmet step(s)", issues.len())]
pub struct IncompleteWeekError {
    /// The pool.
    pub pool_id: PoolId,
    /// The week.
    pub week: u32,
    /// Every unmet step and illegal transition.
    pub issues: Vec<StepIssue>,
}

impl IncompleteWeekError {
    /// Whether the error names `step` for any cycle.
    pub fn names_step(&self, step: CeremonyStep) -> bool {
        self.issues
            .iter()
            .any(|issue| matches!(issue, StepIssue::MissingStep { step: s, .. } if *s == step))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn issues_display_one_based_cycles() {
        let issue = StepIssue::MissingStep {
            cycle: Some(1),
            step: CeremonyStep::AwaitingArena,
        };
        assert_eq!(issue.to_string(), "cycle 2: Arena winner not recorded");
        assert_eq!(issue.cycle(), Some(1));
    }

    #[test]
    fn issues_serialize_tagged() {
        let issue = StepIssue::MissingBallotField {
            field: BallotField::RunnerUp,
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["issue"], "missing_ballot_field");
        assert_eq!(json["field"], "runner_up");
    }
}
