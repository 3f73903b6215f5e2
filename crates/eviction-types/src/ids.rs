//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in a pool has a strongly-typed ID so a contestant can never
//! be passed where a team or rule is expected. All IDs use UUID v7
//! (time-ordered), which also gives rows a stable creation order that the
//! scoring engine relies on for deterministic tie-breaking.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a fantasy pool (one season of one league).
    PoolId
}

define_id! {
    /// Unique identifier for a contestant on the show's roster.
    ContestantId
}

define_id! {
    /// Unique identifier for a scoring rule row.
    ScoringRuleId
}

define_id! {
    /// Unique identifier for an ad hoc special event.
    SpecialEventId
}

define_id! {
    /// Unique identifier for a participant team within a pool.
    TeamId
}

define_id! {
    /// Unique identifier for an end-of-season bonus question.
    BonusQuestionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let contestant = ContestantId::new();
        let pool = PoolId::new();
        assert_ne!(contestant.into_inner(), Uuid::nil());
        assert_ne!(pool.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = ContestantId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<ContestantId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_parses_from_display() {
        let id = TeamId::new();
        let parsed: Result<TeamId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }
}
