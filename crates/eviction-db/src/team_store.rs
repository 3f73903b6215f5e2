//! Participant teams and bonus questions.

use std::collections::BTreeMap;

use eviction_types::{BonusQuestion, BonusQuestionId, ContestantId, PoolId, Team, TeamId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `teams` and `bonus_questions` tables.
pub struct TeamStore<'a> {
    pool: &'a PgPool,
}

impl<'a> TeamStore<'a> {
    /// Create a new team store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a team, its picks, and its bonus answers.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn upsert_team(&self, team: &Team) -> Result<(), DbError> {
        let picks: Vec<Uuid> = team.picks.iter().copied().map(Uuid::from).collect();
        let answers = serde_json::to_value(&team.bonus_answers)?;

        sqlx::query(
            r"INSERT INTO teams (id, pool_id, name, picks, bonus_answers)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (id) DO UPDATE
              SET name = EXCLUDED.name,
                  picks = EXCLUDED.picks,
                  bonus_answers = EXCLUDED.bonus_answers",
        )
        .bind(team.id.into_inner())
        .bind(team.pool_id.into_inner())
        .bind(&team.name)
        .bind(&picks)
        .bind(&answers)
        .execute(self.pool)
        .await?;

        tracing::debug!(team_id = %team.id, picks = picks.len(), "Upserted team");
        Ok(())
    }

    /// The pool's teams in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Serialization`] for malformed bonus answers.
    pub async fn list_teams(&self, pool_id: PoolId) -> Result<Vec<Team>, DbError> {
        let rows = sqlx::query_as::<_, TeamRow>(
            r"SELECT id, pool_id, name, picks, bonus_answers
              FROM teams
              WHERE pool_id = $1
              ORDER BY created_at, id",
        )
        .bind(pool_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Team::try_from).collect()
    }

    /// Insert or replace a bonus question.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn upsert_bonus_question(&self, question: &BonusQuestion) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO bonus_questions (id, pool_id, prompt, points, correct_answer)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (id) DO UPDATE
              SET prompt = EXCLUDED.prompt,
                  points = EXCLUDED.points,
                  correct_answer = EXCLUDED.correct_answer",
        )
        .bind(question.id.into_inner())
        .bind(question.pool_id.into_inner())
        .bind(&question.prompt)
        .bind(question.points)
        .bind(question.correct_answer.as_deref())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// The pool's bonus questions in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_bonus_questions(
        &self,
        pool_id: PoolId,
    ) -> Result<Vec<BonusQuestion>, DbError> {
        let rows = sqlx::query_as::<_, BonusQuestionRow>(
            r"SELECT id, pool_id, prompt, points, correct_answer
              FROM bonus_questions
              WHERE pool_id = $1
              ORDER BY created_at, id",
        )
        .bind(pool_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(BonusQuestion::from).collect())
    }
}

/// A row from the `teams` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamRow {
    /// Team UUID.
    pub id: Uuid,
    /// Owning pool.
    pub pool_id: Uuid,
    /// Display name.
    pub name: String,
    /// Drafted contestant UUIDs.
    pub picks: Vec<Uuid>,
    /// Answers keyed by question UUID.
    pub bonus_answers: serde_json::Value,
}

impl TryFrom<TeamRow> for Team {
    type Error = DbError;

    fn try_from(row: TeamRow) -> Result<Self, Self::Error> {
        let bonus_answers: BTreeMap<BonusQuestionId, String> =
            serde_json::from_value(row.bonus_answers)?;
        Ok(Self {
            id: TeamId(row.id),
            pool_id: PoolId(row.pool_id),
            name: row.name,
            picks: row.picks.into_iter().map(ContestantId).collect(),
            bonus_answers,
        })
    }
}

/// A row from the `bonus_questions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BonusQuestionRow {
    /// Question UUID.
    pub id: Uuid,
    /// Owning pool.
    pub pool_id: Uuid,
    /// Question text.
    pub prompt: String,
    /// Points for a correct answer.
    pub points: i32,
    /// The correct answer, once known.
    pub correct_answer: Option<String>,
}

impl From<BonusQuestionRow> for BonusQuestion {
    fn from(row: BonusQuestionRow) -> Self {
        Self {
            id: BonusQuestionId(row.id),
            pool_id: PoolId(row.pool_id),
            prompt: row.prompt,
            points: row.points,
            correct_answer: row.correct_answer,
        }
    }
}
