//! Ceremony step state machine and week record validators.
//!
//! A week's ceremony state is never stored. Each eviction cycle's current
//! [`CeremonyStep`] is derived from which fields are filled, so an editor
//! can resume a half-saved draft from any point.
//!
//! Checks come in two strengths:
//!
//! 1. **Constraints** ([`check_constraints`]) are structural
//!    contradictions such as the HOH on the block or an overlapping
//!    replacement nominee. They reject any write, draft or not.
//! 2. **Step issues** ([`validate_week`]) are unmet steps and illegal
//!    transitions. They are advisory while drafting and only become hard
//!    preconditions at submit ([`validate_for_submit`]).
//!
//! # Modules
//!
//! - [`steps`] -- Step derivation per cycle.
//! - [`constraints`] -- Write-time structural constraints.
//! - [`validation`] -- The [`CeremonyContext`] and step validators.
//! - [`issues`] -- [`StepIssue`] and [`IncompleteWeekError`].
//! - [`progress`] -- The per-cycle progress view shown to editors.
//!
//! [`CeremonyStep`]: eviction_types::CeremonyStep

pub mod constraints;
pub mod issues;
pub mod progress;
pub mod steps;
pub mod validation;

pub use constraints::{ConstraintViolation, check_constraints, constraint_violations};
pub use issues::{BallotField, IncompleteWeekError, Role, StepIssue};
pub use progress::{CycleProgress, FinaleProgress, WeekProgress, week_progress};
pub use steps::{applicable_steps, current_step, missing_ballot_fields, missing_steps};
pub use validation::{CeremonyContext, validate_for_submit, validate_week};
