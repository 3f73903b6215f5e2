//! The progress view shown to an editor resuming a week.

use eviction_types::{CeremonyStep, WeekEventRecord, WeekVariant};
use serde::Serialize;

use crate::issues::{BallotField, StepIssue};
use crate::steps::{applicable_steps, current_step, missing_ballot_fields};
use crate::validation::{CeremonyContext, validate_week};

/// One eviction cycle's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleProgress {
    /// 0-based cycle index.
    pub index: usize,
    /// The first unmet step, or `Complete`.
    pub step: CeremonyStep,
    /// Steps the editor may record now: every applicable step up to and
    /// including the current one. Later steps stay disabled until the
    /// earlier ones are recorded and free of issues.
    pub enabled_steps: Vec<CeremonyStep>,
    /// Issues belonging to this cycle.
    pub issues: Vec<StepIssue>,
}

/// Finale ballot progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinaleProgress {
    /// Required fields still empty.
    pub missing: Vec<BallotField>,
    /// Issues belonging to the ballot.
    pub issues: Vec<StepIssue>,
}

/// The whole week's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekProgress {
    /// Week number.
    pub week: u32,
    /// Week variant.
    pub variant: WeekVariant,
    /// Per-cycle progress, empty for the finale.
    pub cycles: Vec<CycleProgress>,
    /// Ballot progress, for the finale only.
    pub finale: Option<FinaleProgress>,
    /// Whether submit would succeed right now.
    pub ready_to_submit: bool,
}

/// Derive the progress view for `record`.
///
/// An issue on a recorded step blocks the steps after it, so an editor
/// fixes an illegal nomination before moving on to the veto.
pub fn week_progress(ctx: &CeremonyContext<'_>, record: &WeekEventRecord) -> WeekProgress {
    let issues = validate_week(ctx, record);

    let cycles = record
        .cycles
        .iter()
        .enumerate()
        .map(|(index, cycle)| {
            let step = current_step(cycle);
            let cycle_issues: Vec<StepIssue> = issues
                .iter()
                .filter(|issue| issue.cycle() == Some(index))
                .cloned()
                .collect();
            let blocked = cycle_issues
                .iter()
                .any(|issue| !matches!(issue, StepIssue::MissingStep { .. }));
            let enabled_steps = applicable_steps(cycle)
                .into_iter()
                .filter(|s| *s <= step)
                .filter(|s| !blocked || *s < step || *s == CeremonyStep::AwaitingHoh)
                .collect();
            CycleProgress {
                index,
                step,
                enabled_steps,
                issues: cycle_issues,
            }
        })
        .collect();

    let finale = record.finale.as_ref().map(|ballot| FinaleProgress {
        missing: missing_ballot_fields(ballot),
        issues: issues
            .iter()
            .filter(|issue| issue.cycle().is_none())
            .cloned()
            .collect(),
    });

    WeekProgress {
        week: record.week_number,
        variant: record.variant,
        cycles,
        finale,
        ready_to_submit: issues.is_empty(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use eviction_scoring::defaults::default_rules;
    use eviction_scoring::{RosterResolver, ScoringRuleTable};
    use eviction_types::{Contestant, ContestantId, PoolId, PoolSettings};

    use super::*;

    #[test]
    fn progress_reports_step_and_enabled_actions() {
        let pool = PoolId::new();
        let cast: Vec<Contestant> = (0..4)
            .map(|i| Contestant {
                id: ContestantId::new(),
                name: format!("Houseguest {i}"),
                pool_id: pool,
                is_active: true,
                final_placement: None,
            })
            .collect();
        let roster = RosterResolver::new(&cast, &[], &[]);
        let settings = PoolSettings::default();
        let rules = ScoringRuleTable::new(pool, default_rules());
        let ctx = CeremonyContext {
            settings: &settings,
            roster: &roster,
            rules: &rules,
            jury_phase_week: None,
        };

        let mut record = WeekEventRecord::new(pool, 1, WeekVariant::Regular);
        record.cycles[0].hoh_winner = Some(cast[0].id);

        let progress = week_progress(&ctx, &record);
        assert!(!progress.ready_to_submit);
        let cycle = &progress.cycles[0];
        assert_eq!(cycle.step, CeremonyStep::AwaitingNominees);
        assert_eq!(
            cycle.enabled_steps,
            vec![CeremonyStep::AwaitingHoh, CeremonyStep::AwaitingNominees]
        );
        assert!(progress.finale.is_none());
    }

    #[test]
    fn finale_progress_lists_missing_fields() {
        let pool = PoolId::new();
        let roster = RosterResolver::default();
        let settings = PoolSettings::default();
        let rules = ScoringRuleTable::new(pool, default_rules());
        let ctx = CeremonyContext {
            settings: &settings,
            roster: &roster,
            rules: &rules,
            jury_phase_week: None,
        };

        let record = WeekEventRecord::new(pool, 9, WeekVariant::Final);
        let progress = week_progress(&ctx, &record);
        assert!(progress.cycles.is_empty());
        let finale = progress.finale.unwrap();
        assert_eq!(finale.missing.len(), 3);
        assert_eq!(finale.issues.len(), 3);
    }
}
