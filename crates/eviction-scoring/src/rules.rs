//! The scoring rule table: `(category, subcategory)` to signed points.
//!
//! A table is built for one pool from every rule row visible to it: the
//! pool's own rules plus the pool-independent defaults. Lookups prefer, in
//! order:
//!
//! 1. a pool-scoped rule over a default rule,
//! 2. the latest `effective_from_week` not after the week being scored,
//! 3. the most recently created rule (UUID v7 order).
//!
//! Rule edits that should not rewrite history are expressed as a new rule
//! version with a later `effective_from_week`; editing a row in place
//! deliberately changes every week it covers.

use std::collections::BTreeMap;

use eviction_types::{PoolId, ScoringCategory, ScoringRule, ScoringRuleId};

use crate::RuleConfigWarning;

/// Pool-scoped, versioned scoring rule lookup.
#[derive(Debug, Clone)]
pub struct ScoringRuleTable {
    pool_id: PoolId,
    /// Active rules visible to the pool, grouped by key.
    by_key: BTreeMap<(ScoringCategory, String), Vec<ScoringRule>>,
    /// Every visible rule, active or not, for reference resolution.
    by_id: BTreeMap<ScoringRuleId, ScoringRule>,
    warnings: Vec<RuleConfigWarning>,
}

/// Ordering key: later is preferred.
fn precedence(rule: &ScoringRule) -> (bool, u32, ScoringRuleId) {
    (rule.pool_id.is_some(), rule.effective_from_week, rule.id)
}

impl ScoringRuleTable {
    /// Build the table for `pool_id` from raw rule rows.
    ///
    /// Rows scoped to other pools are ignored. Duplicated active rows
    /// (same scope, key, and effective week) are reported as
    /// [`RuleConfigWarning::DuplicateRule`] and resolved in favour of the
    /// most recently created row.
    pub fn new(pool_id: PoolId, rules: impl IntoIterator<Item = ScoringRule>) -> Self {
        let mut by_key: BTreeMap<(ScoringCategory, String), Vec<ScoringRule>> = BTreeMap::new();
        let mut by_id = BTreeMap::new();

        for rule in rules {
            if rule.pool_id.is_some_and(|p| p != pool_id) {
                continue;
            }
            if rule.is_active {
                by_key
                    .entry((rule.category, rule.subcategory.clone()))
                    .or_default()
                    .push(rule.clone());
            }
            by_id.insert(rule.id, rule);
        }

        for versions in by_key.values_mut() {
            versions.sort_by_key(precedence);
        }

        let warnings = detect_duplicates(&by_key);
        for warning in &warnings {
            tracing::warn!(pool_id = %pool_id, %warning, "scoring rule configuration error");
        }

        Self {
            pool_id,
            by_key,
            by_id,
            warnings,
        }
    }

    /// The pool this table was built for.
    pub const fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    /// Configuration problems found while building the table.
    pub fn warnings(&self) -> &[RuleConfigWarning] {
        &self.warnings
    }

    /// The rule that applies to `(category, subcategory)` in `week`.
    pub fn find(
        &self,
        category: ScoringCategory,
        subcategory: &str,
        week: u32,
    ) -> Option<&ScoringRule> {
        self.by_key
            .get(&(category, subcategory.to_owned()))?
            .iter()
            .filter(|rule| rule.effective_from_week <= week)
            .max_by_key(|rule| precedence(rule))
    }

    /// Points for `(category, subcategory)` in `week`, or a
    /// [`RuleConfigWarning::MissingRule`] when no rule applies.
    pub fn resolve(
        &self,
        category: ScoringCategory,
        subcategory: &str,
        week: u32,
    ) -> Result<i32, RuleConfigWarning> {
        self.find(category, subcategory, week)
            .map(|rule| rule.points)
            .ok_or_else(|| RuleConfigWarning::MissingRule {
                category,
                subcategory: subcategory.to_owned(),
                week,
            })
    }

    /// Points for `(category, subcategory)` in `week`, falling back to 0
    /// with a logged warning when no rule applies.
    pub fn get_points(&self, category: ScoringCategory, subcategory: &str, week: u32) -> i32 {
        match self.resolve(category, subcategory, week) {
            Ok(points) => points,
            Err(warning) => {
                tracing::warn!(pool_id = %self.pool_id, %warning, "missing scoring rule");
                0
            }
        }
    }

    /// Any visible rule row by id, active or not.
    pub fn rule_by_id(&self, id: ScoringRuleId) -> Option<&ScoringRule> {
        self.by_id.get(&id)
    }

    /// The applicable rule for `subcategory` in any category, preferring
    /// [`ScoringCategory::Special`].
    pub fn find_by_subcategory(&self, subcategory: &str, week: u32) -> Option<&ScoringRule> {
        self.find(ScoringCategory::Special, subcategory, week).or_else(|| {
            ScoringCategory::ALL
                .into_iter()
                .find_map(|category| self.find(category, subcategory, week))
        })
    }

    /// Every visible rule row, in id order.
    pub fn rules(&self) -> impl Iterator<Item = &ScoringRule> {
        self.by_id.values()
    }
}

fn detect_duplicates(
    by_key: &BTreeMap<(ScoringCategory, String), Vec<ScoringRule>>,
) -> Vec<RuleConfigWarning> {
    let mut warnings = Vec::new();
    for ((category, subcategory), versions) in by_key {
        let mut groups: BTreeMap<(bool, u32), Vec<ScoringRuleId>> = BTreeMap::new();
        for rule in versions {
            groups
                .entry((rule.pool_id.is_some(), rule.effective_from_week))
                .or_default()
                .push(rule.id);
        }
        for ((pool_scoped, effective_from_week), mut ids) in groups {
            if ids.len() < 2 {
                continue;
            }
            ids.sort_unstable();
            let Some(kept) = ids.pop() else {
                continue;
            };
            warnings.push(RuleConfigWarning::DuplicateRule {
                category: *category,
                subcategory: subcategory.clone(),
                pool_scoped,
                effective_from_week,
                kept,
                ignored: ids,
            });
        }
    }
    warnings
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eviction_types::subcategory;

    use super::*;

    fn rule(subcategory: &str, points: i32) -> ScoringRule {
        ScoringRule::default_rule(ScoringCategory::Competition, subcategory, points)
    }

    #[test]
    fn pool_rule_overrides_default() {
        let pool = PoolId::new();
        let table = ScoringRuleTable::new(
            pool,
            vec![
                rule(subcategory::HOH_WINNER, 10),
                rule(subcategory::HOH_WINNER, 15).for_pool(pool),
            ],
        );
        assert_eq!(table.get_points(ScoringCategory::Competition, subcategory::HOH_WINNER, 1), 15);
        assert!(table.warnings().is_empty());
    }

    #[test]
    fn other_pools_rules_are_invisible() {
        let pool = PoolId::new();
        let table = ScoringRuleTable::new(
            pool,
            vec![
                rule(subcategory::HOH_WINNER, 10),
                rule(subcategory::HOH_WINNER, 99).for_pool(PoolId::new()),
            ],
        );
        assert_eq!(table.get_points(ScoringCategory::Competition, subcategory::HOH_WINNER, 1), 10);
    }

    #[test]
    fn missing_rule_scores_zero_with_warning() {
        let table = ScoringRuleTable::new(PoolId::new(), Vec::new());
        assert_eq!(table.get_points(ScoringCategory::Competition, subcategory::POV_WINNER, 3), 0);
        assert!(matches!(
            table.resolve(ScoringCategory::Competition, subcategory::POV_WINNER, 3),
            Err(RuleConfigWarning::MissingRule { week: 3, .. })
        ));
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let pool = PoolId::new();
        let mut disabled = rule(subcategory::HOH_WINNER, 50).for_pool(pool);
        disabled.is_active = false;
        let table =
            ScoringRuleTable::new(pool, vec![rule(subcategory::HOH_WINNER, 10), disabled.clone()]);
        assert_eq!(table.get_points(ScoringCategory::Competition, subcategory::HOH_WINNER, 1), 10);
        assert!(table.rule_by_id(disabled.id).is_some());
    }

    #[test]
    fn later_version_applies_only_from_its_week() {
        let pool = PoolId::new();
        let table = ScoringRuleTable::new(
            pool,
            vec![
                rule(subcategory::HOH_WINNER, 10),
                rule(subcategory::HOH_WINNER, 20).effective_from(5),
            ],
        );
        assert_eq!(table.get_points(ScoringCategory::Competition, subcategory::HOH_WINNER, 4), 10);
        assert_eq!(table.get_points(ScoringCategory::Competition, subcategory::HOH_WINNER, 5), 20);
    }

    #[test]
    fn duplicates_resolve_to_highest_id() {
        let pool = PoolId::new();
        let mut older = rule(subcategory::HOH_WINNER, 10).for_pool(pool);
        older.id = ScoringRuleId(uuid::Uuid::from_u128(1));
        let mut newer = rule(subcategory::HOH_WINNER, 12).for_pool(pool);
        newer.id = ScoringRuleId(uuid::Uuid::from_u128(2));

        let table = ScoringRuleTable::new(pool, vec![newer.clone(), older.clone()]);
        assert_eq!(table.get_points(ScoringCategory::Competition, subcategory::HOH_WINNER, 1), 12);
        assert_eq!(
            table.warnings(),
            &[RuleConfigWarning::DuplicateRule {
                category: ScoringCategory::Competition,
                subcategory: subcategory::HOH_WINNER.to_owned(),
                pool_scoped: true,
                effective_from_week: 1,
                kept: newer.id,
                ignored: vec![older.id],
            }]
        );
    }

    #[test]
    fn find_by_subcategory_prefers_special() {
        let pool = PoolId::new();
        let table = ScoringRuleTable::new(
            pool,
            vec![
                ScoringRule::default_rule(ScoringCategory::Ceremony, subcategory::REMOVED, -3),
                ScoringRule::default_rule(ScoringCategory::Special, subcategory::REMOVED, -10),
            ],
        );
        let found = table.find_by_subcategory(subcategory::REMOVED, 1).unwrap();
        assert_eq!(found.points, -10);
    }
}
