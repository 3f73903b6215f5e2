//! Special-event ingestion.
//!
//! A stored [`SpecialEvent`] names its type either as a literal
//! subcategory (`"self_evicted"`) or as a reference to a rule row
//! (`"rule:<uuid>"`, or a bare UUID written by older clients). Ingestion
//! resolves both forms against the [`ScoringRuleTable`] once, producing
//! [`TaggedEvent`]s so every downstream consumer has a single lookup path.

use eviction_types::subcategory::{REMOVED, RETURNED, SELF_EVICTED};
use eviction_types::{
    ContestantId, EventKind, ScoringCategory, ScoringRuleId, SpecialEvent, SpecialEventId,
};

use crate::RuleConfigWarning;
use crate::rules::ScoringRuleTable;

/// Prefix marking a rule reference in `SpecialEvent::event_type`.
pub const RULE_REFERENCE_PREFIX: &str = "rule:";

/// A special event with its identifier resolved.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TaggedEvent {
    /// The source event.
    pub id: SpecialEventId,
    /// Roster effect.
    pub kind: EventKind,
    /// The contestant affected.
    pub contestant_id: ContestantId,
    /// The week the event happened in.
    pub week: u32,
    /// Points awarded, copied from the stored event.
    pub points: i32,
    /// The resolved subcategory, if the identifier could be resolved.
    pub subcategory: Option<String>,
}

/// Map a resolved subcategory onto its roster effect.
pub fn kind_for_subcategory(subcategory: &str) -> EventKind {
    match subcategory {
        RETURNED => EventKind::Return,
        SELF_EVICTED => EventKind::Quit,
        REMOVED => EventKind::Eviction,
        _ => EventKind::Other,
    }
}

/// Parse a rule reference, if `event_type` is one.
fn parse_rule_reference(event_type: &str) -> Option<ScoringRuleId> {
    let raw = event_type
        .strip_prefix(RULE_REFERENCE_PREFIX)
        .unwrap_or(event_type);
    raw.trim().parse().ok()
}

/// Resolve a stored identifier to its subcategory.
///
/// # Errors
///
/// Returns [`RuleConfigWarning::UnknownRuleReference`] when the identifier
/// is a rule reference and no visible rule has that id.
pub fn resolve_subcategory(
    event_type: &str,
    rules: &ScoringRuleTable,
) -> Result<String, RuleConfigWarning> {
    let looks_like_reference = event_type.starts_with(RULE_REFERENCE_PREFIX);
    match parse_rule_reference(event_type) {
        Some(rule_id) => rules
            .rule_by_id(rule_id)
            .map(|rule| rule.subcategory.clone())
            .ok_or_else(|| RuleConfigWarning::UnknownRuleReference {
                reference: event_type.to_owned(),
            }),
        None if looks_like_reference => Err(RuleConfigWarning::UnknownRuleReference {
            reference: event_type.to_owned(),
        }),
        None => Ok(event_type.trim().to_owned()),
    }
}

/// Whether `event_type` references a special rule the pool defined itself.
///
/// Such custom types need no entry in the pool's enabled list; creating the
/// rule is what enables them.
pub fn references_pool_rule(event_type: &str, rules: &ScoringRuleTable) -> bool {
    parse_rule_reference(event_type)
        .and_then(|id| rules.rule_by_id(id))
        .is_some_and(|rule| rule.pool_id.is_some() && rule.category == ScoringCategory::Special)
}

/// Resolve every special event, sorted by week and then creation order.
///
/// Unresolvable references still contribute their stored points but have
/// no roster effect; the warning is returned alongside.
pub fn ingest_special_events(
    events: &[SpecialEvent],
    rules: &ScoringRuleTable,
) -> (Vec<TaggedEvent>, Vec<RuleConfigWarning>) {
    let mut tagged = Vec::with_capacity(events.len());
    let mut warnings = Vec::new();

    for event in events.iter().filter(|e| e.pool_id == rules.pool_id()) {
        let subcategory = match resolve_subcategory(&event.event_type, rules) {
            Ok(subcategory) => Some(subcategory),
            Err(warning) => {
                tracing::warn!(event_id = %event.id, %warning, "unresolved special event type");
                warnings.push(warning);
                None
            }
        };
        tagged.push(TaggedEvent {
            id: event.id,
            kind: subcategory
                .as_deref()
                .map_or(EventKind::Other, kind_for_subcategory),
            contestant_id: event.contestant_id,
            week: event.week_number,
            points: event.points_awarded,
            subcategory,
        });
    }

    tagged.sort_by_key(|e| (e.week, e.id));
    (tagged, warnings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use eviction_types::{PoolId, ScoringCategory, ScoringRule};

    use super::*;

    fn event(pool: PoolId, event_type: &str, week: u32) -> SpecialEvent {
        SpecialEvent {
            id: SpecialEventId::new(),
            pool_id: pool,
            contestant_id: ContestantId::new(),
            week_number: week,
            event_type: event_type.to_owned(),
            points_awarded: -10,
            description: String::new(),
        }
    }

    #[test]
    fn literal_subcategory_resolves_directly() {
        let pool = PoolId::new();
        let rules = ScoringRuleTable::new(pool, Vec::new());
        let (tagged, warnings) = ingest_special_events(&[event(pool, SELF_EVICTED, 5)], &rules);
        assert!(warnings.is_empty());
        assert_eq!(tagged[0].kind, EventKind::Quit);
    }

    #[test]
    fn rule_reference_resolves_through_table() {
        let pool = PoolId::new();
        let removal = ScoringRule::default_rule(ScoringCategory::Special, REMOVED, -10);
        let reference = format!("rule:{}", removal.id);
        let bare = removal.id.to_string();
        let rules = ScoringRuleTable::new(pool, vec![removal]);

        let (tagged, warnings) =
            ingest_special_events(&[event(pool, &reference, 3), event(pool, &bare, 4)], &rules);
        assert!(warnings.is_empty());
        assert_eq!(tagged[0].kind, EventKind::Eviction);
        assert_eq!(tagged[1].kind, EventKind::Eviction);
        assert_eq!(tagged[1].subcategory.as_deref(), Some(REMOVED));
    }

    #[test]
    fn unknown_reference_keeps_points_without_roster_effect() {
        let pool = PoolId::new();
        let rules = ScoringRuleTable::new(pool, Vec::new());
        let (tagged, warnings) =
            ingest_special_events(&[event(pool, "rule:not-a-uuid", 2)], &rules);
        assert_eq!(warnings.len(), 1);
        assert_eq!(tagged[0].kind, EventKind::Other);
        assert_eq!(tagged[0].points, -10);
    }

    #[test]
    fn only_pool_special_rules_count_as_custom_types() {
        let pool = PoolId::new();
        let default = ScoringRule::default_rule(ScoringCategory::Special, REMOVED, -10);
        let mut custom = ScoringRule::default_rule(ScoringCategory::Special, "showmance", 3);
        custom.pool_id = Some(pool);
        let mut bonus = ScoringRule::default_rule(ScoringCategory::Competition, "punishment", -2);
        bonus.pool_id = Some(pool);
        let (default_ref, custom_ref, bonus_ref) = (
            format!("rule:{}", default.id),
            format!("rule:{}", custom.id),
            format!("rule:{}", bonus.id),
        );
        let rules = ScoringRuleTable::new(pool, vec![default, custom, bonus]);

        assert!(references_pool_rule(&custom_ref, &rules));
        assert!(!references_pool_rule(&default_ref, &rules));
        assert!(!references_pool_rule(&bonus_ref, &rules));
        assert!(!references_pool_rule("showmance", &rules));
    }

    #[test]
    fn custom_types_are_points_only() {
        assert_eq!(kind_for_subcategory("showmance"), EventKind::Other);
        assert_eq!(kind_for_subcategory(RETURNED), EventKind::Return);
    }

    #[test]
    fn events_sort_by_week() {
        let pool = PoolId::new();
        let rules = ScoringRuleTable::new(pool, Vec::new());
        let (tagged, _) = ingest_special_events(
            &[event(pool, "reward", 6), event(pool, "penalty", 2)],
            &rules,
        );
        assert_eq!(tagged[0].week, 2);
        assert_eq!(tagged[1].week, 6);
    }
}
