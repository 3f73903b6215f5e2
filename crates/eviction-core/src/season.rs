//! The season-completion checklist.
//!
//! Completion is one-way, so it is gated on a named list of checks. Each
//! check reports independently; the season may be completed only when
//! every one passes.

use std::collections::BTreeSet;

use eviction_ceremony::{BallotField, missing_ballot_fields};
use eviction_types::{BonusQuestion, Contestant, PoolId, PoolSettings, Team, WeekEventRecord};
use serde::Serialize;

/// One named completion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonCheck {
    /// A final week has been recorded.
    FinalWeekRecorded,
    /// The finale ballot names a winner, runner-up, and fan favorite.
    FinalBallotComplete,
    /// Every recorded week has been submitted.
    AllWeeksSubmitted,
    /// Every bonus question has a correct answer.
    BonusQuestionsAnswered,
    /// Every contestant has a final placement.
    FinalPlacementsSet,
    /// Teams exist, each with a full draft of roster contestants.
    StandingsComputable,
    /// No winners record exists yet.
    SeasonNotCompleted,
}

impl SeasonCheck {
    /// Every check, in evaluation order.
    pub const ALL: [Self; 7] = [
        Self::FinalWeekRecorded,
        Self::FinalBallotComplete,
        Self::AllWeeksSubmitted,
        Self::BonusQuestionsAnswered,
        Self::FinalPlacementsSet,
        Self::StandingsComputable,
        Self::SeasonNotCompleted,
    ];

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FinalWeekRecorded => "final_week_recorded",
            Self::FinalBallotComplete => "final_ballot_complete",
            Self::AllWeeksSubmitted => "all_weeks_submitted",
            Self::BonusQuestionsAnswered => "bonus_questions_answered",
            Self::FinalPlacementsSet => "final_placements_set",
            Self::StandingsComputable => "standings_computable",
            Self::SeasonNotCompleted => "season_not_completed",
        }
    }
}

impl core::fmt::Display for SeasonCheck {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// The check.
    pub check: SeasonCheck,
    /// Whether it passed.
    pub passed: bool,
    /// What is missing, when it failed.
    pub detail: Option<String>,
}

impl CheckResult {
    fn pass(check: SeasonCheck) -> Self {
        Self {
            check,
            passed: true,
            detail: None,
        }
    }

    fn fail(check: SeasonCheck, detail: impl Into<String>) -> Self {
        Self {
            check,
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// Every check's outcome for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonChecklist {
    /// The pool.
    pub pool_id: PoolId,
    /// One result per [`SeasonCheck`], in evaluation order.
    pub checks: Vec<CheckResult>,
}

impl SeasonChecklist {
    /// Whether every check passed.
    pub fn is_ready(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// The checks that failed.
    pub fn failing(&self) -> Vec<CheckResult> {
        self.checks.iter().filter(|c| !c.passed).cloned().collect()
    }
}

/// Season completion refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error(
    "season of pool {pool_id} cannot be completed; failing checks: {}",
    failing.iter().map(|c| c.check.as_str()).collect::<Vec<_>>().join(", ")
)]
pub struct IncompleteSeasonError {
    /// The pool.
    pub pool_id: PoolId,
    /// The failing checks.
    pub failing: Vec<CheckResult>,
}

/// What the checklist reads.
#[derive(Debug, Clone, Copy)]
pub struct SeasonInputs<'a> {
    /// The pool.
    pub pool_id: PoolId,
    /// The roster.
    pub contestants: &'a [Contestant],
    /// Every week record.
    pub weeks: &'a [WeekEventRecord],
    /// Teams.
    pub teams: &'a [Team],
    /// Bonus questions.
    pub questions: &'a [BonusQuestion],
    /// The pool's settings; fixes the draft size.
    pub settings: &'a PoolSettings,
    /// Whether a winners record already exists.
    pub completed: bool,
}

fn check_final_week(inputs: &SeasonInputs<'_>) -> (CheckResult, CheckResult) {
    let Some(finale) = inputs.weeks.iter().find(|w| w.is_final_week()) else {
        return (
            CheckResult::fail(SeasonCheck::FinalWeekRecorded, "no week is marked as the finale"),
            CheckResult::fail(SeasonCheck::FinalBallotComplete, "no finale ballot"),
        );
    };
    let recorded = CheckResult::pass(SeasonCheck::FinalWeekRecorded);
    let missing = finale
        .finale
        .as_ref()
        .map(missing_ballot_fields)
        .unwrap_or_default();
    let ballot = if finale.finale.is_some() && missing.is_empty() {
        CheckResult::pass(SeasonCheck::FinalBallotComplete)
    } else {
        let names: Vec<&str> = missing.iter().copied().map(BallotField::as_str).collect();
        CheckResult::fail(
            SeasonCheck::FinalBallotComplete,
            format!("missing: {}", names.join(", ")),
        )
    };
    (recorded, ballot)
}

fn check_weeks_submitted(inputs: &SeasonInputs<'_>) -> CheckResult {
    let open: Vec<String> = inputs
        .weeks
        .iter()
        .filter(|w| w.is_draft || !w.is_complete)
        .map(|w| w.week_number.to_string())
        .collect();
    if open.is_empty() {
        CheckResult::pass(SeasonCheck::AllWeeksSubmitted)
    } else {
        CheckResult::fail(
            SeasonCheck::AllWeeksSubmitted,
            format!("weeks not submitted: {}", open.join(", ")),
        )
    }
}

fn check_bonus_answers(inputs: &SeasonInputs<'_>) -> CheckResult {
    let unanswered = inputs
        .questions
        .iter()
        .filter(|q| q.correct_answer.as_deref().is_none_or(|a| a.trim().is_empty()))
        .count();
    if unanswered == 0 {
        CheckResult::pass(SeasonCheck::BonusQuestionsAnswered)
    } else {
        CheckResult::fail(
            SeasonCheck::BonusQuestionsAnswered,
            format!("{unanswered} bonus question(s) have no correct answer"),
        )
    }
}

fn check_placements(inputs: &SeasonInputs<'_>) -> CheckResult {
    let unplaced = inputs
        .contestants
        .iter()
        .filter(|c| c.final_placement.is_none())
        .count();
    if inputs.contestants.is_empty() {
        CheckResult::fail(SeasonCheck::FinalPlacementsSet, "the roster is empty")
    } else if unplaced == 0 {
        CheckResult::pass(SeasonCheck::FinalPlacementsSet)
    } else {
        CheckResult::fail(
            SeasonCheck::FinalPlacementsSet,
            format!("{unplaced} contestant(s) have no final placement"),
        )
    }
}

fn check_standings(inputs: &SeasonInputs<'_>) -> CheckResult {
    if inputs.teams.is_empty() {
        return CheckResult::fail(SeasonCheck::StandingsComputable, "the pool has no teams");
    }
    let roster: BTreeSet<_> = inputs.contestants.iter().map(|c| c.id).collect();
    let strays = inputs
        .teams
        .iter()
        .flat_map(|t| t.picks.iter())
        .filter(|pick| !roster.contains(pick))
        .count();
    let short: Vec<&str> = inputs
        .teams
        .iter()
        .filter(|t| {
            !usize::try_from(inputs.settings.picks_per_team)
                .is_ok_and(|wanted| t.picks.len() == wanted)
        })
        .map(|t| t.name.as_str())
        .collect();

    let mut problems = Vec::new();
    if strays > 0 {
        problems.push(format!("{strays} drafted pick(s) are not on the roster"));
    }
    if !short.is_empty() {
        problems.push(format!(
            "teams without exactly {} pick(s): {}",
            inputs.settings.picks_per_team,
            short.join(", ")
        ));
    }
    if problems.is_empty() {
        CheckResult::pass(SeasonCheck::StandingsComputable)
    } else {
        CheckResult::fail(SeasonCheck::StandingsComputable, problems.join("; "))
    }
}

/// Evaluate every completion check.
pub fn evaluate(inputs: &SeasonInputs<'_>) -> SeasonChecklist {
    let (recorded, ballot) = check_final_week(inputs);
    let not_completed = if inputs.completed {
        CheckResult::fail(SeasonCheck::SeasonNotCompleted, "the season is already complete")
    } else {
        CheckResult::pass(SeasonCheck::SeasonNotCompleted)
    };
    SeasonChecklist {
        pool_id: inputs.pool_id,
        checks: vec![
            recorded,
            ballot,
            check_weeks_submitted(inputs),
            check_bonus_answers(inputs),
            check_placements(inputs),
            check_standings(inputs),
            not_completed,
        ],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeMap;

    use eviction_types::{BonusQuestionId, ContestantId, FinalBallot, TeamId, WeekVariant};

    use super::*;

    struct Season {
        pool: PoolId,
        contestants: Vec<Contestant>,
        weeks: Vec<WeekEventRecord>,
        teams: Vec<Team>,
        questions: Vec<BonusQuestion>,
        settings: PoolSettings,
    }

    impl Season {
        fn finished() -> Self {
            let pool = PoolId::new();
            let contestants: Vec<Contestant> = (1..=3)
                .map(|place| Contestant {
                    id: ContestantId::new(),
                    name: format!("Houseguest {place}"),
                    pool_id: pool,
                    is_active: true,
                    final_placement: Some(place),
                })
                .collect();
            let mut finale = WeekEventRecord::new(pool, 10, WeekVariant::Final);
            finale.is_draft = false;
            finale.is_complete = true;
            finale.finale = Some(FinalBallot {
                final_hoh_winner: None,
                winner: Some(contestants[0].id),
                runner_up: Some(contestants[1].id),
                americas_favorite: Some(contestants[2].id),
            });
            let teams = vec![Team {
                id: TeamId::new(),
                pool_id: pool,
                name: "Alpha".to_owned(),
                picks: vec![contestants[0].id, contestants[1].id],
                bonus_answers: BTreeMap::new(),
            }];
            let questions = vec![BonusQuestion {
                id: BonusQuestionId::new(),
                pool_id: pool,
                prompt: "Who wins?".to_owned(),
                points: 5,
                correct_answer: Some("Houseguest 1".to_owned()),
            }];
            Self {
                pool,
                contestants,
                weeks: vec![finale],
                teams,
                questions,
                settings: PoolSettings::default(),
            }
        }

        fn evaluate(&self, completed: bool) -> SeasonChecklist {
            evaluate(&SeasonInputs {
                pool_id: self.pool,
                contestants: &self.contestants,
                weeks: &self.weeks,
                teams: &self.teams,
                questions: &self.questions,
                settings: &self.settings,
                completed,
            })
        }
    }

    fn failing(checklist: &SeasonChecklist) -> Vec<SeasonCheck> {
        checklist.failing().iter().map(|c| c.check).collect()
    }

    #[test]
    fn finished_season_passes_every_check() {
        let checklist = Season::finished().evaluate(false);
        assert!(checklist.is_ready());
        let names: Vec<SeasonCheck> = checklist.checks.iter().map(|c| c.check).collect();
        assert_eq!(names, SeasonCheck::ALL.to_vec());
    }

    #[test]
    fn each_gap_fails_its_own_check() {
        let mut season = Season::finished();
        season.questions[0].correct_answer = None;
        season.contestants[2].final_placement = None;
        season.weeks[0].is_draft = true;
        assert_eq!(
            failing(&season.evaluate(false)),
            vec![
                SeasonCheck::AllWeeksSubmitted,
                SeasonCheck::BonusQuestionsAnswered,
                SeasonCheck::FinalPlacementsSet,
            ]
        );
    }

    #[test]
    fn no_finale_fails_both_finale_checks() {
        let mut season = Season::finished();
        season.weeks.clear();
        assert_eq!(
            failing(&season.evaluate(false)),
            vec![SeasonCheck::FinalWeekRecorded, SeasonCheck::FinalBallotComplete]
        );
    }

    #[test]
    fn incomplete_ballot_is_named() {
        let mut season = Season::finished();
        if let Some(ballot) = season.weeks[0].finale.as_mut() {
            ballot.americas_favorite = None;
        }
        let checklist = season.evaluate(false);
        let ballot = &checklist.checks[1];
        assert!(!ballot.passed);
        assert_eq!(ballot.detail.as_deref(), Some("missing: americas_favorite"));
    }

    #[test]
    fn completed_season_cannot_complete_again() {
        let checklist = Season::finished().evaluate(true);
        assert_eq!(failing(&checklist), vec![SeasonCheck::SeasonNotCompleted]);
    }

    #[test]
    fn stray_picks_block_standings() {
        let mut season = Season::finished();
        season.teams[0].picks[1] = ContestantId::new();
        assert_eq!(failing(&season.evaluate(false)), vec![SeasonCheck::StandingsComputable]);
    }

    #[test]
    fn short_draft_blocks_standings() {
        let mut season = Season::finished();
        season.teams[0].picks.truncate(1);
        let checklist = season.evaluate(false);
        assert_eq!(failing(&checklist), vec![SeasonCheck::StandingsComputable]);
        assert_eq!(
            checklist.checks[5].detail.as_deref(),
            Some("teams without exactly 2 pick(s): Alpha")
        );

        season.settings.picks_per_team = 1;
        assert!(season.evaluate(false).is_ready());
    }

    #[test]
    fn error_lists_failing_check_names() {
        let checklist = Season::finished().evaluate(true);
        let err = IncompleteSeasonError {
            pool_id: checklist.pool_id,
            failing: checklist.failing(),
        };
        assert!(err.to_string().ends_with("failing checks: season_not_completed"));
    }
}
