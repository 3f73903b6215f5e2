//! Configuration, the persistence seam, and the week/season lifecycle.
//!
//! This crate ties the pure crates together: it loads a pool's committed
//! rows through a [`SeasonStore`], runs the ceremony checks on writes,
//! and recomputes points, status, and standings on every read.
//!
//! # Modules
//!
//! - [`config`] -- `eviction-config.yaml` loading and validation.
//! - [`store`] -- The [`SeasonStore`] trait and [`StoreError`].
//! - [`memory`] -- [`MemorySeasonStore`], an in-memory store.
//! - [`season`] -- The season-completion checklist.
//! - [`lifecycle`] -- [`SeasonService`], the public library API.

pub mod config;
pub mod lifecycle;
pub mod memory;
pub mod season;
pub mod store;

pub use config::{ConfigError, EngineConfig, LogFormat};
pub use lifecycle::{LifecycleError, SeasonService, WeekDraft, WeekSnapshot};
pub use memory::MemorySeasonStore;
pub use season::{CheckResult, IncompleteSeasonError, SeasonCheck, SeasonChecklist};
pub use store::{SeasonStore, StoreError, WeekWrite};
