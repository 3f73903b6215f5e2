//! Ad hoc special event rows.

use eviction_types::{ContestantId, PoolId, SpecialEvent, SpecialEventId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, to_i32, to_u32};

/// Operations on the `special_events` table.
pub struct SpecialEventStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SpecialEventStore<'a> {
    /// Create a new special event store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every special event of the pool, by week then creation order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_for_pool(&self, pool_id: PoolId) -> Result<Vec<SpecialEvent>, DbError> {
        let rows = sqlx::query_as::<_, SpecialEventRow>(
            r"SELECT id, pool_id, contestant_id, week_number, event_type, points_awarded,
                     description
              FROM special_events
              WHERE pool_id = $1
              ORDER BY week_number, id",
        )
        .bind(pool_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SpecialEvent::try_from).collect()
    }
}

/// Replace one week's special events inside the caller's transaction.
pub(crate) async fn replace_week_events(
    conn: &mut PgConnection,
    pool_id: PoolId,
    week: u32,
    events: &[SpecialEvent],
) -> Result<(), DbError> {
    let removed = delete_week_events(&mut *conn, pool_id, week).await?;

    if !events.is_empty() {
        let ids: Vec<Uuid> = events.iter().map(|e| e.id.into_inner()).collect();
        let contestants: Vec<Uuid> = events.iter().map(|e| e.contestant_id.into_inner()).collect();
        let event_types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        let points: Vec<i32> = events.iter().map(|e| e.points_awarded).collect();
        let descriptions: Vec<&str> = events.iter().map(|e| e.description.as_str()).collect();

        sqlx::query(
            r"INSERT INTO special_events
                (id, pool_id, contestant_id, week_number, event_type, points_awarded, description)
              SELECT id, $1, contestant_id, $2, event_type, points_awarded, description
              FROM UNNEST($3::uuid[], $4::uuid[], $5::text[], $6::int4[], $7::text[])
                AS e(id, contestant_id, event_type, points_awarded, description)",
        )
        .bind(pool_id.into_inner())
        .bind(to_i32(week))
        .bind(&ids)
        .bind(&contestants)
        .bind(&event_types)
        .bind(&points)
        .bind(&descriptions)
        .execute(&mut *conn)
        .await?;
    }

    tracing::debug!(
        pool_id = %pool_id,
        week,
        removed,
        inserted = events.len(),
        "Replaced special events"
    );
    Ok(())
}

/// Delete one week's special events inside the caller's transaction.
pub(crate) async fn delete_week_events(
    conn: &mut PgConnection,
    pool_id: PoolId,
    week: u32,
) -> Result<u64, DbError> {
    let result =
        sqlx::query(r"DELETE FROM special_events WHERE pool_id = $1 AND week_number = $2")
            .bind(pool_id.into_inner())
            .bind(to_i32(week))
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected())
}

/// A row from the `special_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpecialEventRow {
    /// Event UUID.
    pub id: Uuid,
    /// Owning pool.
    pub pool_id: Uuid,
    /// The contestant the event applies to.
    pub contestant_id: Uuid,
    /// Week the event happened in.
    pub week_number: i32,
    /// Subcategory literal or `rule:<uuid>` reference.
    pub event_type: String,
    /// Points added to the weekly bucket.
    pub points_awarded: i32,
    /// Free-text note.
    pub description: String,
}

impl TryFrom<SpecialEventRow> for SpecialEvent {
    type Error = DbError;

    fn try_from(row: SpecialEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SpecialEventId(row.id),
            pool_id: PoolId(row.pool_id),
            contestant_id: ContestantId(row.contestant_id),
            week_number: to_u32("week_number", row.week_number)?,
            event_type: row.event_type,
            points_awarded: row.points_awarded,
            description: row.description,
        })
    }
}
