//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode of a command run.

use eviction_core::LifecycleError;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: eviction_core::ConfigError,
    },

    /// Connecting, migrating or seeding the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying data layer error.
        #[from]
        source: eviction_db::DbError,
    },

    /// The season service refused or failed the command.
    #[error("{source}")]
    Lifecycle {
        /// The underlying lifecycle error.
        #[from]
        source: LifecycleError,
    },

    /// A week file could not be read.
    #[error("failed to read {path}: {source}")]
    Input {
        /// The file that was read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// JSON input or output failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Structured detail for refusals an operator needs to act on: the
    /// unmet steps of a week, the violated constraint, or the failing
    /// season checks.
    pub fn rejection_detail(&self) -> Option<serde_json::Value> {
        let Self::Lifecycle { source } = self else {
            return None;
        };
        let detail = match source {
            LifecycleError::IncompleteWeek { source } => serde_json::to_value(source),
            LifecycleError::Constraint { source } => serde_json::to_value(source),
            LifecycleError::IncompleteSeason { source } => serde_json::to_value(source),
            LifecycleError::Store { .. } => return None,
        };
        detail.ok()
    }
}

#[cfg(test)]
mod tests {
    use eviction_core::StoreError;
    use eviction_types::PoolId;

    use super::*;

    #[test]
    fn store_failures_carry_no_detail() {
        let err = EngineError::from(LifecycleError::from(StoreError::SeasonFrozen {
            pool_id: PoolId::new(),
        }));
        assert!(err.rejection_detail().is_none());
        assert!(err.to_string().contains("frozen"));
    }
}
