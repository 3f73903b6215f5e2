//! The points calculation engine.
//!
//! [`compute_points`] is a pure function of the roster, the week records,
//! the special events, and the rule table. It replays every week in order
//! and rebuilds each contestant's weekly and cumulative totals from
//! scratch; there is no stored running total to patch.
//!
//! Points only flow from explicitly named events. A nominee who survives
//! the block earns nothing unless the pool defines a
//! `survived_nomination` rule.

use std::collections::{BTreeMap, BTreeSet};

use eviction_types::subcategory::{
    AMERICAS_FAVORITE, ARENA_WINNER, EVICTED, FINAL_HOH_WINNER, HOH_WINNER, NOMINATED, POV_WINNER,
    REPLACEMENT_NOMINEE, RUNNER_UP, SAVED_BY_VETO, SURVIVED_NOMINATION, WINNER,
};
use eviction_types::{
    Contestant, ContestantId, EvictionCycle, FinalBallot, PoolId, ScoringCategory, SpecialEvent,
    SpecialEventId, WeekEventRecord,
};
use serde::Serialize;

use crate::RuleConfigWarning;
use crate::events::{TaggedEvent, ingest_special_events};
use crate::roster::RosterResolver;
use crate::rules::ScoringRuleTable;

/// Everything the engine reads.
#[derive(Debug, Clone, Copy)]
pub struct PointsInput<'a> {
    /// The pool being scored.
    pub pool_id: PoolId,
    /// The pool's roster.
    pub contestants: &'a [Contestant],
    /// Every week record of the pool, in any order.
    pub weeks: &'a [WeekEventRecord],
    /// Every special event of the pool, in any order.
    pub special_events: &'a [SpecialEvent],
    /// The pool's rule table.
    pub rules: &'a ScoringRuleTable,
    /// Whether unsubmitted draft weeks contribute.
    pub include_drafts: bool,
}

/// Where a point award came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AwardSource {
    /// A structured ceremony or finale field, scored by rule.
    Rule {
        /// Rule category.
        category: ScoringCategory,
        /// Rule subcategory.
        subcategory: String,
        /// Eviction cycle index within the week; `None` for the finale.
        cycle: Option<usize>,
    },
    /// A special event's stored points.
    SpecialEvent {
        /// The source event.
        event_id: SpecialEventId,
    },
}

/// One line of the audit trail behind the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointAward {
    /// The week the points land in.
    pub week: u32,
    /// The contestant credited.
    pub contestant_id: ContestantId,
    /// Signed points.
    pub points: i64,
    /// What produced the award.
    pub source: AwardSource,
}

/// One contestant's computed totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContestantPoints {
    /// Points earned in each week.
    pub weekly: BTreeMap<u32, i64>,
    /// Running total at the end of each week.
    pub cumulative: BTreeMap<u32, i64>,
    /// Total after the last week.
    pub total: i64,
    /// Whether the contestant is in the game after the last week.
    pub active: bool,
}

/// The engine's full output for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointsTable {
    /// The pool scored.
    pub pool_id: PoolId,
    /// Every week that contributed, ascending.
    pub weeks: Vec<u32>,
    /// Per-contestant totals.
    pub contestants: BTreeMap<ContestantId, ContestantPoints>,
    /// Audit trail, in replay order.
    pub awards: Vec<PointAward>,
    /// Rule configuration problems met while scoring, deduplicated.
    pub warnings: Vec<RuleConfigWarning>,
}

impl PointsTable {
    /// A contestant's total, 0 if they never scored.
    pub fn total_for(&self, contestant_id: ContestantId) -> i64 {
        self.contestants
            .get(&contestant_id)
            .map_or(0, |points| points.total)
    }

    /// A contestant's points in one week, 0 if none.
    pub fn weekly_for(&self, contestant_id: ContestantId, week: u32) -> i64 {
        self.contestants
            .get(&contestant_id)
            .and_then(|points| points.weekly.get(&week).copied())
            .unwrap_or(0)
    }
}

/// Collects awards for one week.
struct WeekScorer<'a> {
    week: u32,
    rules: &'a ScoringRuleTable,
    awards: Vec<PointAward>,
    warnings: BTreeSet<RuleConfigWarning>,
}

impl<'a> WeekScorer<'a> {
    const fn new(week: u32, rules: &'a ScoringRuleTable) -> Self {
        Self {
            week,
            rules,
            awards: Vec::new(),
            warnings: BTreeSet::new(),
        }
    }

    fn push(&mut self, contestant_id: ContestantId, points: i32, source: AwardSource) {
        self.awards.push(PointAward {
            week: self.week,
            contestant_id,
            points: i64::from(points),
            source,
        });
    }

    /// Score a mandatory rule; a missing rule scores 0 with a warning.
    fn required(
        &mut self,
        contestant: Option<ContestantId>,
        category: ScoringCategory,
        subcategory: &str,
        cycle: Option<usize>,
    ) {
        let Some(contestant_id) = contestant else {
            return;
        };
        let points = match self.rules.resolve(category, subcategory, self.week) {
            Ok(points) => points,
            Err(warning) => {
                self.warnings.insert(warning);
                0
            }
        };
        self.push(
            contestant_id,
            points,
            AwardSource::Rule {
                category,
                subcategory: subcategory.to_owned(),
                cycle,
            },
        );
    }

    /// Score an optional rule; silently nothing when the pool has none.
    fn optional(&mut self, contestant_id: ContestantId, subcategory: &str, cycle: usize) {
        let Some(rule) = self
            .rules
            .find(ScoringCategory::Ceremony, subcategory, self.week)
        else {
            return;
        };
        let points = rule.points;
        self.push(
            contestant_id,
            points,
            AwardSource::Rule {
                category: ScoringCategory::Ceremony,
                subcategory: subcategory.to_owned(),
                cycle: Some(cycle),
            },
        );
    }

    fn score_cycle(&mut self, index: usize, cycle: &EvictionCycle) {
        let at = Some(index);
        self.required(cycle.hoh_winner, ScoringCategory::Competition, HOH_WINNER, at);
        self.required(cycle.pov_winner, ScoringCategory::Competition, POV_WINNER, at);
        self.required(cycle.ai_arena_winner, ScoringCategory::Competition, ARENA_WINNER, at);
        self.required(cycle.evicted_contestant(), ScoringCategory::Ceremony, EVICTED, at);

        for nominee in &cycle.nominees {
            self.optional(*nominee, NOMINATED, index);
        }
        if cycle.veto_used() {
            if let Some(saved) = cycle.pov_used_on {
                self.optional(saved, SAVED_BY_VETO, index);
            }
            if let Some(replacement) = cycle.replacement_nominee {
                self.optional(replacement, REPLACEMENT_NOMINEE, index);
            }
        }
        if cycle.evicted.is_some() {
            let evicted = cycle.evicted_contestant();
            for survivor in cycle.final_nominees() {
                if Some(survivor) != evicted {
                    self.optional(survivor, SURVIVED_NOMINATION, index);
                }
            }
        }
    }

    fn score_finale(&mut self, ballot: &FinalBallot) {
        self.required(ballot.final_hoh_winner, ScoringCategory::Finale, FINAL_HOH_WINNER, None);
        self.required(ballot.winner, ScoringCategory::Finale, WINNER, None);
        self.required(ballot.runner_up, ScoringCategory::Finale, RUNNER_UP, None);
        self.required(ballot.americas_favorite, ScoringCategory::Finale, AMERICAS_FAVORITE, None);
    }

    fn score_special(&mut self, event: &TaggedEvent) {
        self.push(
            event.contestant_id,
            event.points,
            AwardSource::SpecialEvent { event_id: event.id },
        );
    }
}

/// Compute every contestant's weekly and cumulative points.
///
/// Deterministic: the same inputs always produce the same table, whatever
/// order the rows arrive in. Unset fields of a partially recorded week
/// contribute nothing.
pub fn compute_points(input: &PointsInput<'_>) -> PointsTable {
    let rules = input.rules;
    let mut warnings: BTreeSet<RuleConfigWarning> = rules.warnings().iter().cloned().collect();

    let (mut weeks, excluded): (Vec<WeekEventRecord>, Vec<WeekEventRecord>) = input
        .weeks
        .iter()
        .filter(|w| w.pool_id == input.pool_id)
        .cloned()
        .partition(|w| input.include_drafts || !w.is_draft);
    weeks.sort_by_key(|w| w.week_number);

    // Events of an excluded draft week are part of that draft.
    let excluded_weeks: BTreeSet<u32> = excluded.iter().map(|w| w.week_number).collect();
    let events: Vec<SpecialEvent> = input
        .special_events
        .iter()
        .filter(|e| e.pool_id == input.pool_id && !excluded_weeks.contains(&e.week_number))
        .cloned()
        .collect();

    let (tagged, ingest_warnings) = ingest_special_events(&events, rules);
    warnings.extend(ingest_warnings);

    let mut week_numbers: BTreeSet<u32> = weeks.iter().map(|w| w.week_number).collect();
    week_numbers.extend(tagged.iter().map(|e| e.week));

    let mut awards = Vec::new();
    for &week in &week_numbers {
        let mut scorer = WeekScorer::new(week, rules);
        for record in weeks.iter().filter(|w| w.week_number == week) {
            for (index, cycle) in record.cycles.iter().enumerate() {
                scorer.score_cycle(index, cycle);
            }
            if let Some(ballot) = &record.finale {
                scorer.score_finale(ballot);
            }
        }
        for event in tagged.iter().filter(|e| e.week == week) {
            scorer.score_special(event);
        }
        warnings.extend(scorer.warnings);
        awards.extend(scorer.awards);
    }

    let mut contestants: BTreeMap<ContestantId, ContestantPoints> = input
        .contestants
        .iter()
        .filter(|c| c.pool_id == input.pool_id)
        .map(|c| (c.id, ContestantPoints::default()))
        .collect();
    for award in &awards {
        let entry = contestants.entry(award.contestant_id).or_default();
        let bucket = entry.weekly.entry(award.week).or_insert(0);
        *bucket = bucket.saturating_add(award.points);
    }

    let resolver = RosterResolver::new(input.contestants, &weeks, &tagged);
    let last_week = week_numbers.last().copied().unwrap_or(0);

    for (contestant_id, points) in &mut contestants {
        let mut running: i64 = 0;
        for &week in &week_numbers {
            let earned = *points.weekly.entry(week).or_insert(0);
            running = running.saturating_add(earned);
            points.cumulative.insert(week, running);
        }
        points.total = running;
        points.active = resolver.status_as_of_week(*contestant_id, last_week).active;
    }

    for warning in &warnings {
        tracing::debug!(pool_id = %input.pool_id, %warning, "scoring warning");
    }
    tracing::debug!(
        pool_id = %input.pool_id,
        weeks = week_numbers.len(),
        contestants = contestants.len(),
        awards = awards.len(),
        "Computed points"
    );

    PointsTable {
        pool_id: input.pool_id,
        weeks: week_numbers.into_iter().collect(),
        contestants,
        awards,
        warnings: warnings.into_iter().collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use eviction_types::subcategory::SELF_EVICTED;
    use eviction_types::{EvictionOutcome, ScoringRule, WeekVariant};

    use super::*;
    use crate::defaults::default_rules;

    struct Cast {
        alice: ContestantId,
        bob: ContestantId,
        cara: ContestantId,
        dan: ContestantId,
    }

    fn cast() -> Cast {
        Cast {
            alice: ContestantId::new(),
            bob: ContestantId::new(),
            cara: ContestantId::new(),
            dan: ContestantId::new(),
        }
    }

    fn scenario_a_week(pool: PoolId, cast: &Cast) -> WeekEventRecord {
        let mut week = WeekEventRecord::new(pool, 1, WeekVariant::Regular);
        let cycle = &mut week.cycles[0];
        cycle.hoh_winner = Some(cast.alice);
        cycle.nominees = vec![cast.bob, cast.cara];
        cycle.pov_winner = Some(cast.bob);
        cycle.pov_used = Some(true);
        cycle.pov_used_on = Some(cast.bob);
        cycle.replacement_nominee = Some(cast.dan);
        cycle.evicted = Some(EvictionOutcome::Evicted(cast.cara));
        week
    }

    fn run(
        pool: PoolId,
        weeks: &[WeekEventRecord],
        events: &[SpecialEvent],
        rules: &ScoringRuleTable,
    ) -> PointsTable {
        compute_points(&PointsInput {
            pool_id: pool,
            contestants: &[],
            weeks,
            special_events: events,
            rules,
            include_drafts: true,
        })
    }

    #[test]
    fn scenario_a_only_named_events_score() {
        let pool = PoolId::new();
        let cast = cast();
        let rules = ScoringRuleTable::new(pool, default_rules());
        let table = run(pool, &[scenario_a_week(pool, &cast)], &[], &rules);

        assert_eq!(table.total_for(cast.alice), 10);
        assert_eq!(table.total_for(cast.bob), 7);
        assert_eq!(table.total_for(cast.cara), -5);
        assert_eq!(table.total_for(cast.dan), 0);
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn survived_nomination_scores_only_with_a_rule() {
        let pool = PoolId::new();
        let cast = cast();
        let mut rules = default_rules();
        rules.push(
            ScoringRule::default_rule(ScoringCategory::Ceremony, SURVIVED_NOMINATION, 2)
                .for_pool(pool),
        );
        let rules = ScoringRuleTable::new(pool, rules);
        let table = run(pool, &[scenario_a_week(pool, &cast)], &[], &rules);
        assert_eq!(table.total_for(cast.dan), 2);
        assert_eq!(table.total_for(cast.cara), -5);
    }

    #[test]
    fn scenario_b_double_eviction_lands_in_one_week() {
        let pool = PoolId::new();
        let (eve, finn, gus) = (ContestantId::new(), ContestantId::new(), ContestantId::new());
        let mut week = WeekEventRecord::new(pool, 6, WeekVariant::DoubleEviction);
        week.cycles[0].nominees = vec![eve, gus];
        week.cycles[0].evicted = Some(EvictionOutcome::Evicted(eve));
        week.cycles[1].nominees = vec![finn, gus];
        week.cycles[1].evicted = Some(EvictionOutcome::Evicted(finn));
        let rules = ScoringRuleTable::new(pool, default_rules());
        let table = run(pool, &[week], &[], &rules);

        assert_eq!(table.weekly_for(eve, 6), -5);
        assert_eq!(table.weekly_for(finn, 6), -5);
        assert_eq!(table.total_for(gus), 0);
        assert_eq!(table.weeks, vec![6]);
    }

    #[test]
    fn special_events_add_stored_points() {
        let pool = PoolId::new();
        let gail = ContestantId::new();
        let event = SpecialEvent {
            id: SpecialEventId::new(),
            pool_id: pool,
            contestant_id: gail,
            week_number: 5,
            event_type: "showmance".to_owned(),
            points_awarded: 3,
            description: "Custom award".to_owned(),
        };
        let rules = ScoringRuleTable::new(pool, default_rules());
        let table = run(pool, &[], &[event], &rules);
        assert_eq!(table.weekly_for(gail, 5), 3);
    }

    #[test]
    fn cumulative_is_running_sum_in_week_order() {
        let pool = PoolId::new();
        let alice = ContestantId::new();
        let mut week2 = WeekEventRecord::new(pool, 2, WeekVariant::Regular);
        week2.cycles[0].hoh_winner = Some(alice);
        let mut week1 = WeekEventRecord::new(pool, 1, WeekVariant::Regular);
        week1.cycles[0].pov_winner = Some(alice);
        let week3 = WeekEventRecord::new(pool, 3, WeekVariant::Regular);

        let rules = ScoringRuleTable::new(pool, default_rules());
        let table = run(pool, &[week2, week3, week1], &[], &rules);
        let points = &table.contestants[&alice];
        assert_eq!(points.cumulative[&1], 7);
        assert_eq!(points.cumulative[&2], 17);
        assert_eq!(points.cumulative[&3], 17);
        assert_eq!(points.weekly[&3], 0);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let pool = PoolId::new();
        let cast = cast();
        let rules = ScoringRuleTable::new(pool, default_rules());
        let weeks = [scenario_a_week(pool, &cast)];
        let first = run(pool, &weeks, &[], &rules);
        let second = run(pool, &weeks, &[], &rules);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_rule_scores_zero_and_warns_once() {
        let pool = PoolId::new();
        let cast = cast();
        let rules = ScoringRuleTable::new(pool, Vec::new());
        let table = run(pool, &[scenario_a_week(pool, &cast)], &[], &rules);
        assert_eq!(table.total_for(cast.alice), 0);
        let hoh_warnings = table
            .warnings
            .iter()
            .filter(|w| {
                matches!(
                    w,
                    RuleConfigWarning::MissingRule { subcategory, .. } if subcategory == HOH_WINNER
                )
            })
            .count();
        assert_eq!(hoh_warnings, 1);
    }

    #[test]
    fn drafts_can_be_excluded() {
        let pool = PoolId::new();
        let cast = cast();
        let rules = ScoringRuleTable::new(pool, default_rules());
        let weeks = [scenario_a_week(pool, &cast)];
        let table = compute_points(&PointsInput {
            pool_id: pool,
            contestants: &[],
            weeks: &weeks,
            special_events: &[],
            rules: &rules,
            include_drafts: false,
        });
        assert_eq!(table.total_for(cast.alice), 0);
    }

    #[test]
    fn excluded_draft_week_drops_its_special_events() {
        let pool = PoolId::new();
        let (alice, gail) = (ContestantId::new(), ContestantId::new());
        let event = |week_number, points_awarded| SpecialEvent {
            id: SpecialEventId::new(),
            pool_id: pool,
            contestant_id: gail,
            week_number,
            event_type: SELF_EVICTED.to_owned(),
            points_awarded,
            description: String::new(),
        };

        let mut submitted = WeekEventRecord::new(pool, 4, WeekVariant::Regular);
        submitted.is_draft = false;
        submitted.is_complete = true;
        let mut draft = WeekEventRecord::new(pool, 5, WeekVariant::Regular);
        draft.cycles[0].hoh_winner = Some(alice);

        let contestants = [gail].map(|id| Contestant {
            id,
            name: "Gail".to_owned(),
            pool_id: pool,
            is_active: true,
            final_placement: None,
        });
        let rules = ScoringRuleTable::new(pool, default_rules());
        let table = compute_points(&PointsInput {
            pool_id: pool,
            contestants: &contestants,
            weeks: &[submitted, draft],
            special_events: &[event(5, -10)],
            rules: &rules,
            include_drafts: false,
        });

        assert_eq!(table.total_for(alice), 0);
        assert_eq!(table.total_for(gail), 0);
        assert_eq!(table.weeks, vec![4]);
        assert!(table.contestants[&gail].active);
    }

    #[test]
    fn finale_ballot_scores_placements() {
        let pool = PoolId::new();
        let cast = cast();
        let mut finale = WeekEventRecord::new(pool, 12, WeekVariant::Final);
        finale.finale = Some(FinalBallot {
            final_hoh_winner: Some(cast.alice),
            winner: Some(cast.alice),
            runner_up: Some(cast.bob),
            americas_favorite: Some(cast.cara),
        });
        let rules = ScoringRuleTable::new(pool, default_rules());
        let table = run(pool, &[finale], &[], &rules);
        assert_eq!(table.total_for(cast.alice), 30);
        assert_eq!(table.total_for(cast.bob), 10);
        assert_eq!(table.total_for(cast.cara), 5);
    }
}
