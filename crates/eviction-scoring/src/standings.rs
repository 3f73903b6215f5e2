//! Team leaderboard.
//!
//! A team scores the total points of its drafted contestants plus the
//! points of every bonus question it answered correctly. Ranking uses
//! standard competition ranking: tied teams share a rank and the next
//! rank skips (1, 1, 3).

use eviction_types::{BonusQuestion, Team, TeamStanding};

use crate::points::PointsTable;

/// Whether a submitted answer matches the correct one.
///
/// Comparison ignores surrounding whitespace and ASCII case.
pub fn answer_matches(submitted: &str, correct: &str) -> bool {
    submitted.trim().eq_ignore_ascii_case(correct.trim())
}

fn bonus_points(team: &Team, questions: &[BonusQuestion]) -> i64 {
    questions
        .iter()
        .filter(|q| q.pool_id == team.pool_id)
        .filter_map(|q| {
            let correct = q.correct_answer.as_deref()?;
            let submitted = team.bonus_answers.get(&q.id)?;
            answer_matches(submitted, correct).then_some(i64::from(q.points))
        })
        .fold(0_i64, i64::saturating_add)
}

/// Build the ranked leaderboard for the teams of `points.pool_id`.
///
/// Teams from other pools are ignored. Ties are ordered by name, then id,
/// so the output order is stable.
pub fn compute_standings(
    teams: &[Team],
    questions: &[BonusQuestion],
    points: &PointsTable,
) -> Vec<TeamStanding> {
    let mut standings: Vec<TeamStanding> = teams
        .iter()
        .filter(|t| t.pool_id == points.pool_id)
        .map(|team| {
            let contestant_points = team
                .picks
                .iter()
                .map(|pick| points.total_for(*pick))
                .fold(0_i64, i64::saturating_add);
            let bonus_points = bonus_points(team, questions);
            TeamStanding {
                team_id: team.id,
                team_name: team.name.clone(),
                rank: 0,
                contestant_points,
                bonus_points,
                total: contestant_points.saturating_add(bonus_points),
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.team_name.cmp(&b.team_name))
            .then_with(|| a.team_id.cmp(&b.team_id))
    });

    let mut previous: Option<(i64, u32)> = None;
    for (index, standing) in standings.iter_mut().enumerate() {
        let position = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
        standing.rank = match previous {
            Some((total, rank)) if total == standing.total => rank,
            _ => position,
        };
        previous = Some((standing.total, standing.rank));
    }

    standings
}
