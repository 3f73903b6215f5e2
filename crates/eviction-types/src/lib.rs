//! Shared type definitions for the eviction pool scoring engine.
//!
//! This crate is the single source of truth for the entities every other
//! crate in the workspace passes around. Types flow downstream to
//! `TypeScript` via `ts-rs` for the administrative surface and the
//! leaderboard views.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Scoring categories, week variants, ceremony steps
//! - [`structs`] -- Roster, rules, special events, teams, season records
//! - [`week`] -- The week event record and its eviction cycles
//! - [`legacy`] -- Adapter for the flat `second_*` / `third_*` record shape
//! - [`subcategory`] -- Well-known scoring rule subcategory names

pub mod enums;
pub mod ids;
pub mod legacy;
pub mod structs;
pub mod subcategory;
pub mod week;

// Re-export all public types at crate root for convenience.
pub use enums::{CeremonyStep, EventKind, ScoringCategory, StatusReason, WeekVariant};
pub use ids::{BonusQuestionId, ContestantId, PoolId, ScoringRuleId, SpecialEventId, TeamId};
pub use legacy::{LegacyShapeError, LegacyWeekRecord};
pub use structs::{
    BonusQuestion, Contestant, ContestantStatus, PoolSettings, ScoringRule, SpecialEvent, Team,
    TeamStanding, WinnersRecord,
};
pub use week::{EvictionCycle, EvictionOutcome, FinalBallot, NO_EVICTION, WeekEventRecord};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for every exported type.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files into `bindings/` relative to the crate root
        // when `export_all` is called.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PoolId::export_all();
        let _ = crate::ids::ContestantId::export_all();
        let _ = crate::ids::ScoringRuleId::export_all();
        let _ = crate::ids::SpecialEventId::export_all();
        let _ = crate::ids::TeamId::export_all();
        let _ = crate::ids::BonusQuestionId::export_all();

        // Enums
        let _ = crate::enums::ScoringCategory::export_all();
        let _ = crate::enums::WeekVariant::export_all();
        let _ = crate::enums::CeremonyStep::export_all();
        let _ = crate::enums::EventKind::export_all();
        let _ = crate::enums::StatusReason::export_all();

        // Structs
        let _ = crate::structs::Contestant::export_all();
        let _ = crate::structs::ContestantStatus::export_all();
        let _ = crate::structs::ScoringRule::export_all();
        let _ = crate::structs::SpecialEvent::export_all();
        let _ = crate::structs::PoolSettings::export_all();
        let _ = crate::structs::Team::export_all();
        let _ = crate::structs::BonusQuestion::export_all();
        let _ = crate::structs::TeamStanding::export_all();
        let _ = crate::structs::WinnersRecord::export_all();

        // Week records
        let _ = crate::week::EvictionOutcome::export_all();
        let _ = crate::week::EvictionCycle::export_all();
        let _ = crate::week::FinalBallot::export_all();
        let _ = crate::week::WeekEventRecord::export_all();
        let _ = crate::legacy::LegacyWeekRecord::export_all();
    }
}
