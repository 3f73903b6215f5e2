//! `PostgreSQL` persistence for eviction pools.
//!
//! Every table has a small borrowed store (`XStore<'a>` over a
//! [`sqlx::PgPool`]); [`PgSeasonStore`] composes them into the
//! [`eviction_core::SeasonStore`] the lifecycle manager runs on.
//!
//! # Architecture
//!
//! ```text
//! SeasonService<PgSeasonStore>
//!     |
//!     +-- PgSeasonStore
//!         |-- RosterStore        (contestants, pool settings, placements)
//!         |-- RuleStore          (default + pool rules, default seeding)
//!         |-- WeekStore          (week records, revision + jury guards)
//!         |-- SpecialEventStore  (ad hoc events, replaced per week)
//!         |-- TeamStore          (teams, bonus questions)
//!         +-- WinnersStore       (season completion, frozen check)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool and migrations
//! - [`season_store`] -- The [`eviction_core::SeasonStore`] implementation
//! - [`error`] -- Shared error types

pub mod error;
pub mod postgres;
pub mod roster_store;
pub mod rule_store;
pub mod season_store;
pub mod special_event_store;
pub mod team_store;
pub mod week_store;
pub mod winners_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::PostgresPool;
pub use roster_store::{ContestantRow, PoolSettingsRow, RosterStore};
pub use rule_store::{RuleRow, RuleStore};
pub use season_store::PgSeasonStore;
pub use special_event_store::{SpecialEventRow, SpecialEventStore};
pub use team_store::{BonusQuestionRow, TeamRow, TeamStore};
pub use week_store::{WeekRow, WeekStore};
pub use winners_store::{WinnersRow, WinnersStore};
