//! The default scoring rule catalog.
//!
//! These rows are seeded with `pool_id = None` into a fresh installation.
//! Pools override individual values with pool-scoped rows. The optional
//! ceremony subcategories (nominated, survived nomination, ...) are
//! intentionally absent: passive outcomes score nothing unless a pool adds
//! a rule for them.

use eviction_types::subcategory::{
    AMERICAS_FAVORITE, ARENA_WINNER, EVICTED, FINAL_HOH_WINNER, HOH_WINNER, PENALTY, POV_WINNER,
    REMOVED, RETURNED, REWARD, RUNNER_UP, SELF_EVICTED, WINNER,
};
use eviction_types::{ScoringCategory, ScoringRule};

/// `(category, subcategory, points)` for every default rule.
pub const DEFAULT_RULE_VALUES: [(ScoringCategory, &str, i32); 13] = [
    (ScoringCategory::Competition, HOH_WINNER, 10),
    (ScoringCategory::Competition, POV_WINNER, 7),
    (ScoringCategory::Competition, ARENA_WINNER, 5),
    (ScoringCategory::Ceremony, EVICTED, -5),
    (ScoringCategory::Finale, FINAL_HOH_WINNER, 5),
    (ScoringCategory::Finale, WINNER, 25),
    (ScoringCategory::Finale, RUNNER_UP, 10),
    (ScoringCategory::Finale, AMERICAS_FAVORITE, 5),
    (ScoringCategory::Special, RETURNED, 5),
    (ScoringCategory::Special, SELF_EVICTED, -10),
    (ScoringCategory::Special, REMOVED, -10),
    (ScoringCategory::Special, PENALTY, -5),
    (ScoringCategory::Special, REWARD, 5),
];

/// Build fresh default rule rows.
pub fn default_rules() -> Vec<ScoringRule> {
    DEFAULT_RULE_VALUES
        .iter()
        .map(|(category, subcategory, points)| {
            ScoringRule::default_rule(*category, subcategory, *points)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn default_keys_are_unique() {
        let keys: BTreeSet<(ScoringCategory, &str)> =
            DEFAULT_RULE_VALUES.iter().map(|(c, s, _)| (*c, *s)).collect();
        assert_eq!(keys.len(), DEFAULT_RULE_VALUES.len());
    }

    #[test]
    fn eviction_is_negative() {
        let evicted = default_rules()
            .into_iter()
            .find(|r| r.subcategory == EVICTED)
            .map(|r| r.points);
        assert!(evicted.is_some_and(|p| p < 0));
    }

    #[test]
    fn defaults_are_unscoped_and_active() {
        assert!(default_rules().iter().all(|r| r.pool_id.is_none() && r.is_active));
    }
}
