//! Week event records.
//!
//! Each row keeps the record in the flat [`LegacyWeekRecord`] shape as a
//! JSONB payload, with the columns the database must enforce on copied
//! out beside it: the primary key, the jury-phase flag (one per pool, via
//! a partial unique index), and the revision used for optimistic
//! concurrency.

use chrono::{DateTime, Utc};
use eviction_core::{StoreError, WeekWrite};
use eviction_types::{LegacyWeekRecord, PoolId, WeekEventRecord};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, to_i32, to_u32};
use crate::special_event_store::{delete_week_events, replace_week_events};
use crate::winners_store::ensure_open;

/// Name of the partial unique index guarding the jury-phase flag.
const JURY_WEEK_INDEX: &str = "week_event_records_jury_week";

/// Operations on the `week_event_records` table.
pub struct WeekStore<'a> {
    pool: &'a PgPool,
}

impl<'a> WeekStore<'a> {
    /// Create a new week store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every week record of the pool, in week order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or a decoding
    /// error for a malformed payload.
    pub async fn list_for_pool(&self, pool_id: PoolId) -> Result<Vec<WeekEventRecord>, DbError> {
        let rows = sqlx::query_as::<_, WeekRow>(
            r"SELECT pool_id, week_number, revision, payload, updated_at
              FROM week_event_records
              WHERE pool_id = $1
              ORDER BY week_number",
        )
        .bind(pool_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(WeekEventRecord::try_from).collect()
    }

    /// One week record, if saved.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or a decoding
    /// error for a malformed payload.
    pub async fn get(
        &self,
        pool_id: PoolId,
        week: u32,
    ) -> Result<Option<WeekEventRecord>, DbError> {
        let row = sqlx::query_as::<_, WeekRow>(
            r"SELECT pool_id, week_number, revision, payload, updated_at
              FROM week_event_records
              WHERE pool_id = $1 AND week_number = $2",
        )
        .bind(pool_id.into_inner())
        .bind(to_i32(week))
        .fetch_optional(self.pool)
        .await?;

        row.map(WeekEventRecord::try_from).transpose()
    }

    /// Upsert a week record in one transaction, optionally replacing the
    /// week's special events.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] for a frozen season, a revision
    /// mismatch, or a second jury-phase week; [`DbError::Postgres`] if a
    /// statement fails. Nothing is written on error.
    pub async fn write(&self, write: WeekWrite) -> Result<WeekEventRecord, DbError> {
        let WeekWrite {
            mut record,
            expected_revision,
            special_events,
        } = write;
        let pool_id = record.pool_id;
        let week = record.week_number;

        let mut tx = self.pool.begin().await?;
        ensure_open(&mut tx, pool_id).await?;

        let stored: Option<(i64,)> = sqlx::query_as(
            r"SELECT revision FROM week_event_records
              WHERE pool_id = $1 AND week_number = $2
              FOR UPDATE",
        )
        .bind(pool_id.into_inner())
        .bind(to_i32(week))
        .fetch_optional(&mut *tx)
        .await?;
        let actual = stored.map_or(Ok(0), |(revision,)| to_revision(revision))?;

        if actual != expected_revision {
            return Err(StoreError::RevisionConflict {
                pool_id,
                week,
                expected: expected_revision,
                actual,
            }
            .into());
        }

        if record.is_jury_phase {
            let claimed: Option<(i32,)> = sqlx::query_as(
                r"SELECT week_number FROM week_event_records
                  WHERE pool_id = $1 AND is_jury_phase AND week_number <> $2",
            )
            .bind(pool_id.into_inner())
            .bind(to_i32(week))
            .fetch_optional(&mut *tx)
            .await?;
            if let Some((claimed_by,)) = claimed {
                return Err(StoreError::JuryPhaseTaken {
                    week,
                    claimed_by: to_u32("week_number", claimed_by)?,
                }
                .into());
            }
        }

        let updated_at = Utc::now();
        record.revision = actual.saturating_add(1);
        record.updated_at = Some(updated_at);
        let payload = serde_json::to_value(LegacyWeekRecord::from(&record))?;

        // A concurrent first write slips past FOR UPDATE (no row to lock);
        // the revision guard on the conflict arm catches it.
        let upserted = sqlx::query(
            r"INSERT INTO week_event_records
                (pool_id, week_number, is_draft, is_complete, is_jury_phase, revision, payload,
                 updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
              ON CONFLICT (pool_id, week_number) DO UPDATE
              SET is_draft = EXCLUDED.is_draft,
                  is_complete = EXCLUDED.is_complete,
                  is_jury_phase = EXCLUDED.is_jury_phase,
                  revision = EXCLUDED.revision,
                  payload = EXCLUDED.payload,
                  updated_at = EXCLUDED.updated_at
              WHERE week_event_records.revision = $9",
        )
        .bind(pool_id.into_inner())
        .bind(to_i32(week))
        .bind(record.is_draft)
        .bind(record.is_complete)
        .bind(record.is_jury_phase)
        .bind(to_bind_revision(record.revision))
        .bind(&payload)
        .bind(updated_at)
        .bind(to_bind_revision(expected_revision))
        .execute(&mut *tx)
        .await;

        let upserted = match upserted {
            Ok(result) => result,
            Err(err) if violates(&err, JURY_WEEK_INDEX) => {
                drop(tx);
                let claimed_by = self.jury_week(pool_id).await?.unwrap_or(week);
                return Err(StoreError::JuryPhaseTaken { week, claimed_by }.into());
            }
            Err(err) => return Err(err.into()),
        };

        if upserted.rows_affected() == 0 {
            drop(tx);
            let actual = self
                .get(pool_id, week)
                .await?
                .map_or(0, |stored| stored.revision);
            return Err(StoreError::RevisionConflict {
                pool_id,
                week,
                expected: expected_revision,
                actual,
            }
            .into());
        }

        if let Some(events) = &special_events {
            replace_week_events(&mut tx, pool_id, week, events).await?;
        }

        tx.commit().await?;

        tracing::info!(
            pool_id = %pool_id,
            week,
            revision = record.revision,
            is_draft = record.is_draft,
            replaced_events = special_events.is_some(),
            "Stored week record"
        );
        Ok(record)
    }

    /// Delete a week record and its special events.
    ///
    /// Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] once the season is complete, or
    /// [`DbError::Postgres`] if a delete fails.
    pub async fn delete(&self, pool_id: PoolId, week: u32) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        ensure_open(&mut tx, pool_id).await?;

        let events = delete_week_events(&mut tx, pool_id, week).await?;
        let result =
            sqlx::query(r"DELETE FROM week_event_records WHERE pool_id = $1 AND week_number = $2")
                .bind(pool_id.into_inner())
                .bind(to_i32(week))
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;

        let existed = result.rows_affected() > 0;
        tracing::info!(pool_id = %pool_id, week, existed, events, "Cleared week");
        Ok(existed)
    }

    /// The week currently holding the jury-phase flag.
    async fn jury_week(&self, pool_id: PoolId) -> Result<Option<u32>, DbError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r"SELECT week_number FROM week_event_records
              WHERE pool_id = $1 AND is_jury_phase",
        )
        .bind(pool_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(|(week,)| to_u32("week_number", week)).transpose()
    }
}

/// Whether `err` is a violation of the named constraint or index.
fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

fn to_revision(value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|_negative| DbError::InvalidColumn {
        column: "revision",
        value: value.to_string(),
    })
}

fn to_bind_revision(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// A row from the `week_event_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeekRow {
    /// Owning pool.
    pub pool_id: Uuid,
    /// Week number.
    pub week_number: i32,
    /// Optimistic concurrency counter.
    pub revision: i64,
    /// The record in the flat shape.
    pub payload: serde_json::Value,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<WeekRow> for WeekEventRecord {
    type Error = DbError;

    fn try_from(row: WeekRow) -> Result<Self, Self::Error> {
        let mut flat: LegacyWeekRecord = serde_json::from_value(row.payload)?;
        // Key columns win over whatever the payload carries.
        flat.pool_id = PoolId(row.pool_id);
        flat.week_number = to_u32("week_number", row.week_number)?;
        flat.revision = to_revision(row.revision)?;
        flat.updated_at = Some(row.updated_at);
        Ok(Self::try_from(flat)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use eviction_types::{ContestantId, EvictionOutcome, NO_EVICTION, WeekVariant};

    use super::*;

    fn row_for(record: &WeekEventRecord, revision: i64) -> WeekRow {
        WeekRow {
            pool_id: record.pool_id.into_inner(),
            week_number: to_i32(record.week_number),
            revision,
            payload: serde_json::to_value(LegacyWeekRecord::from(record)).unwrap(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn payload_is_the_flat_shape() {
        let mut record = WeekEventRecord::new(PoolId::new(), 3, WeekVariant::DoubleEviction);
        record.cycles[1].evicted = Some(EvictionOutcome::NoEviction);

        let payload = serde_json::to_value(LegacyWeekRecord::from(&record)).unwrap();
        assert_eq!(payload["is_double_eviction"], true);
        assert_eq!(payload["second_evicted"], NO_EVICTION);
    }

    #[test]
    fn row_columns_override_payload() {
        let evicted = ContestantId::new();
        let mut record = WeekEventRecord::new(PoolId::new(), 4, WeekVariant::Regular);
        record.cycles[0].evicted = Some(EvictionOutcome::Evicted(evicted));
        record.revision = 1;

        let decoded = WeekEventRecord::try_from(row_for(&record, 6)).unwrap();
        assert_eq!(decoded.revision, 6);
        assert!(decoded.updated_at.is_some());
        assert_eq!(decoded.cycles[0].evicted_contestant(), Some(evicted));
    }

    #[test]
    fn negative_revision_is_rejected() {
        let record = WeekEventRecord::new(PoolId::new(), 1, WeekVariant::Regular);
        assert!(matches!(
            WeekEventRecord::try_from(row_for(&record, -1)),
            Err(DbError::InvalidColumn {
                column: "revision",
                ..
            })
        ));
    }

    #[test]
    fn revision_binds_saturate() {
        assert_eq!(to_bind_revision(u64::MAX), i64::MAX);
        assert_eq!(to_revision(3).ok(), Some(3));
    }
}
