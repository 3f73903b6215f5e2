//! Well-known scoring rule subcategories.
//!
//! Subcategories are stored as plain strings so pools can add custom
//! special-event types. The engine only ever looks up the names below.

/// HOH competition winner.
pub const HOH_WINNER: &str = "hoh_winner";
/// POV competition winner.
pub const POV_WINNER: &str = "pov_winner";
/// Arena competition winner.
pub const ARENA_WINNER: &str = "arena_winner";

/// Placed on the block in the initial nominations.
pub const NOMINATED: &str = "nominated";
/// Taken off the block by the veto.
pub const SAVED_BY_VETO: &str = "saved_by_veto";
/// Named as the replacement nominee after the veto.
pub const REPLACEMENT_NOMINEE: &str = "replacement_nominee";
/// Sat on the final block and was not evicted.
pub const SURVIVED_NOMINATION: &str = "survived_nomination";
/// Evicted at the ceremony.
pub const EVICTED: &str = "evicted";

/// Won the season.
pub const WINNER: &str = "winner";
/// Finished second.
pub const RUNNER_UP: &str = "runner_up";
/// Won the fan vote.
pub const AMERICAS_FAVORITE: &str = "americas_favorite";
/// Won the final HOH competition.
pub const FINAL_HOH_WINNER: &str = "final_hoh_winner";

/// Re-entered the game.
pub const RETURNED: &str = "returned";
/// Left the game voluntarily.
pub const SELF_EVICTED: &str = "self_evicted";
/// Removed by production.
pub const REMOVED: &str = "removed";
/// Generic point deduction.
pub const PENALTY: &str = "penalty";
/// Generic point award.
pub const REWARD: &str = "reward";

/// Special event types enabled for a pool unless configured otherwise.
pub const DEFAULT_SPECIAL_EVENTS: [&str; 5] = [RETURNED, SELF_EVICTED, REMOVED, PENALTY, REWARD];

/// Ceremony subcategories that score only when a pool defines a rule for
/// them. Passive survival earns nothing by default.
pub const OPTIONAL: [&str; 4] =
    [NOMINATED, SAVED_BY_VETO, REPLACEMENT_NOMINEE, SURVIVED_NOMINATION];
