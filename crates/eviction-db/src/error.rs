//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] and [`serde_json`] errors. The [`SeasonStore`] implementation
//! converts them into [`StoreError`] at the crate boundary.
//!
//! [`SeasonStore`]: eviction_core::SeasonStore

use eviction_core::StoreError;
use eviction_types::LegacyShapeError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored week payload is not a well-formed flat record.
    #[error("Malformed week payload: {0}")]
    LegacyShape(#[from] LegacyShapeError),

    /// A stored column holds a value the domain types cannot represent.
    #[error("Invalid value in column {column}: {value}")]
    InvalidColumn {
        /// The offending column.
        column: &'static str,
        /// The stored value.
        value: String,
    },

    /// A write was refused by a store rule (revision, jury, frozen).
    #[error(transparent)]
    Rejected(#[from] StoreError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rejected(inner) => inner,
            other => Self::Backend {
                message: other.to_string(),
            },
        }
    }
}

/// Convert a stored `INTEGER` into a week number or count.
pub(crate) fn to_u32(column: &'static str, value: i32) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_overflow| DbError::InvalidColumn {
        column,
        value: value.to_string(),
    })
}

/// Convert a week number or count into an `INTEGER` bind value.
pub(crate) fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
