//! Scoring rule rows.
//!
//! Default rules (`pool_id IS NULL`) are seeded once from
//! [`eviction_scoring::defaults::default_rules`]; pools add their own rows
//! and new rule versions on top.

use eviction_types::{PoolId, ScoringCategory, ScoringRule, ScoringRuleId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, to_i32, to_u32};

/// Operations on the `scoring_rules` table.
pub struct RuleStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RuleStore<'a> {
    /// Create a new rule store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Default rules plus the pool's own rules, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::InvalidColumn`] for an unknown category.
    pub async fn list_for_pool(&self, pool_id: PoolId) -> Result<Vec<ScoringRule>, DbError> {
        let rows = sqlx::query_as::<_, RuleRow>(
            r"SELECT id, pool_id, category, subcategory, points, is_active, effective_from_week
              FROM scoring_rules
              WHERE pool_id IS NULL OR pool_id = $1
              ORDER BY id",
        )
        .bind(pool_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ScoringRule::try_from).collect()
    }

    /// Insert a rule row, default or pool-scoped.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails (including a
    /// duplicate default rule version).
    pub async fn insert(&self, rule: &ScoringRule) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO scoring_rules
                (id, pool_id, category, subcategory, points, is_active, effective_from_week)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(rule.id.into_inner())
        .bind(rule.pool_id.map(PoolId::into_inner))
        .bind(rule.category.as_str())
        .bind(&rule.subcategory)
        .bind(rule.points)
        .bind(rule.is_active)
        .bind(to_i32(rule.effective_from_week))
        .execute(self.pool)
        .await?;

        tracing::debug!(
            rule_id = %rule.id,
            category = %rule.category,
            subcategory = %rule.subcategory,
            "Inserted scoring rule"
        );
        Ok(())
    }

    /// Seed default rules, skipping every `(category, subcategory,
    /// effective_from_week)` that already has a default row.
    ///
    /// Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn seed_defaults(&self, rules: &[ScoringRule]) -> Result<u64, DbError> {
        let defaults: Vec<&ScoringRule> = rules.iter().filter(|r| r.pool_id.is_none()).collect();
        if defaults.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = defaults.iter().map(|r| r.id.into_inner()).collect();
        let categories: Vec<&str> = defaults.iter().map(|r| r.category.as_str()).collect();
        let subcategories: Vec<&str> = defaults.iter().map(|r| r.subcategory.as_str()).collect();
        let points: Vec<i32> = defaults.iter().map(|r| r.points).collect();
        let active: Vec<bool> = defaults.iter().map(|r| r.is_active).collect();
        let effective: Vec<i32> = defaults
            .iter()
            .map(|r| to_i32(r.effective_from_week))
            .collect();

        let result = sqlx::query(
            r"INSERT INTO scoring_rules
                (id, pool_id, category, subcategory, points, is_active, effective_from_week)
              SELECT id, NULL, category, subcategory, points, is_active, effective_from_week
              FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::int4[], $5::bool[], $6::int4[])
                AS r(id, category, subcategory, points, is_active, effective_from_week)
              ON CONFLICT (category, subcategory, effective_from_week)
                WHERE pool_id IS NULL
                DO NOTHING",
        )
        .bind(&ids)
        .bind(&categories)
        .bind(&subcategories)
        .bind(&points)
        .bind(&active)
        .bind(&effective)
        .execute(self.pool)
        .await?;

        let inserted = result.rows_affected();
        tracing::info!(
            offered = defaults.len(),
            inserted,
            "Seeded default scoring rules"
        );
        Ok(inserted)
    }
}

/// A row from the `scoring_rules` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RuleRow {
    /// Rule UUID.
    pub id: Uuid,
    /// Owning pool, `NULL` for a default rule.
    pub pool_id: Option<Uuid>,
    /// Stored category name.
    pub category: String,
    /// Subcategory.
    pub subcategory: String,
    /// Signed point value.
    pub points: i32,
    /// Inactive rules are ignored by lookups.
    pub is_active: bool,
    /// First week the rule version applies to.
    pub effective_from_week: i32,
}

impl TryFrom<RuleRow> for ScoringRule {
    type Error = DbError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        let category =
            ScoringCategory::parse(&row.category).ok_or_else(|| DbError::InvalidColumn {
                column: "category",
                value: row.category.clone(),
            })?;

        Ok(Self {
            id: ScoringRuleId(row.id),
            pool_id: row.pool_id.map(PoolId),
            category,
            subcategory: row.subcategory,
            points: row.points,
            is_active: row.is_active,
            effective_from_week: to_u32("effective_from_week", row.effective_from_week)?,
        })
    }
}
