//! Roster & status resolution: who is in the game as of a given week.
//!
//! Status is never stored per week. It is replayed from the contestant's
//! roster flag and the ordered event log:
//!
//! 1. Structured evictions flip a contestant inactive from that week on,
//!    in cycle order.
//! 2. Special events of the same week apply afterwards, in creation order:
//!    returns flip back to active, quits and removals force inactive
//!    whatever the structured fields say.
//!
//! A contestant whose roster flag is `false` starts active when the log
//! explains the flag (an eviction, quit, or removal is recorded for them),
//! and starts withdrawn otherwise.

use std::collections::{BTreeMap, BTreeSet};

use eviction_types::{
    Contestant, ContestantId, ContestantStatus, EventKind, FinalBallot, StatusReason,
    WeekEventRecord,
};

use crate::events::TaggedEvent;

/// One status change in the replayed log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    week: u32,
    /// Global replay position; later transitions win.
    seq: usize,
    active: bool,
    reason: StatusReason,
}

/// Replays the event log into per-contestant status timelines.
#[derive(Debug, Clone, Default)]
pub struct RosterResolver {
    base: BTreeMap<ContestantId, bool>,
    timelines: BTreeMap<ContestantId, Vec<Transition>>,
}

impl RosterResolver {
    /// Build the resolver from the roster, the week records, and the
    /// ingested special events.
    pub fn new(
        contestants: &[Contestant],
        weeks: &[WeekEventRecord],
        events: &[TaggedEvent],
    ) -> Self {
        let mut ordered: Vec<&WeekEventRecord> = weeks.iter().collect();
        ordered.sort_by_key(|w| w.week_number);

        let mut week_numbers: BTreeSet<u32> = ordered.iter().map(|w| w.week_number).collect();
        week_numbers.extend(events.iter().map(|e| e.week));

        let mut timelines: BTreeMap<ContestantId, Vec<Transition>> = BTreeMap::new();
        let mut seq: usize = 0;

        for week in week_numbers {
            for record in ordered.iter().filter(|r| r.week_number == week) {
                for (_, evicted) in record.evictions() {
                    timelines.entry(evicted).or_default().push(Transition {
                        week,
                        seq,
                        active: false,
                        reason: StatusReason::Evicted { week },
                    });
                    seq = seq.saturating_add(1);
                }
            }

            for event in events.iter().filter(|e| e.week == week) {
                let change = match event.kind {
                    EventKind::Return => Some((true, StatusReason::Returned { week })),
                    EventKind::Quit => Some((false, StatusReason::Quit { week })),
                    EventKind::Eviction => Some((false, StatusReason::Removed { week })),
                    EventKind::Other => None,
                };
                if let Some((active, reason)) = change {
                    timelines.entry(event.contestant_id).or_default().push(Transition {
                        week,
                        seq,
                        active,
                        reason,
                    });
                    seq = seq.saturating_add(1);
                }
            }
        }

        let base = contestants
            .iter()
            .map(|c| {
                let explained = timelines
                    .get(&c.id)
                    .is_some_and(|t| t.iter().any(|tr| !tr.active));
                (c.id, c.is_active || explained)
            })
            .collect();

        Self { base, timelines }
    }

    fn resolve(
        &self,
        contestant_id: ContestantId,
        week: u32,
        include_week: bool,
    ) -> ContestantStatus {
        let base_active = self.base.get(&contestant_id).copied().unwrap_or(true);
        let mut status = ContestantStatus {
            contestant_id,
            week,
            active: base_active,
            reason: if base_active {
                StatusReason::Roster
            } else {
                StatusReason::Withdrawn
            },
        };

        let applies = |t: &&Transition| {
            if include_week { t.week <= week } else { t.week < week }
        };
        if let Some(timeline) = self.timelines.get(&contestant_id) {
            for transition in timeline.iter().filter(applies) {
                status.active = transition.active;
                status.reason = transition.reason;
            }
        }
        status
    }

    /// Status of `contestant_id` as of `week`, with that week's own events
    /// applied.
    ///
    /// Contestants unknown to the roster but named in the log resolve as if
    /// they had started active.
    pub fn status_as_of_week(&self, contestant_id: ContestantId, week: u32) -> ContestantStatus {
        self.resolve(contestant_id, week, true)
    }

    /// Status of `contestant_id` entering `week`: every earlier week
    /// applied, none of `week`'s own events. This is the eligibility view
    /// used while recording `week`.
    pub fn status_entering_week(&self, contestant_id: ContestantId, week: u32) -> ContestantStatus {
        self.resolve(contestant_id, week, false)
    }

    /// Whether the roster knows this contestant.
    pub fn is_on_roster(&self, contestant_id: ContestantId) -> bool {
        self.base.contains_key(&contestant_id)
    }

    /// Every roster contestant eligible to compete in `week`.
    pub fn eligible_for_week(&self, week: u32) -> Vec<ContestantId> {
        self.base
            .keys()
            .copied()
            .filter(|id| self.status_entering_week(*id, week).active)
            .collect()
    }

    /// Replay position of each contestant's most recent exit, if they are
    /// out of the game after every recorded week.
    fn final_exits(&self) -> BTreeMap<ContestantId, usize> {
        self.timelines
            .iter()
            .filter_map(|(id, timeline)| {
                let last = timeline.last()?;
                (!last.active).then_some((*id, last.seq))
            })
            .collect()
    }

    /// Derive final placements (1 = winner) from the log and the finale
    /// ballot.
    ///
    /// The winner places 1st and the runner-up 2nd. Every other contestant
    /// still in the game shares the next placement. Contestants who left
    /// follow in reverse exit order, so the last one out places highest.
    /// Withdrawn contestants share the last placement.
    pub fn final_placements(&self, ballot: Option<&FinalBallot>) -> BTreeMap<ContestantId, u32> {
        let mut placements = BTreeMap::new();
        let mut next: u32 = 1;

        let winner = ballot.and_then(|b| b.winner);
        let runner_up = ballot.and_then(|b| b.runner_up).filter(|r| Some(*r) != winner);
        for finalist in [winner, runner_up].into_iter().flatten() {
            placements.insert(finalist, next);
            next = next.saturating_add(1);
        }

        let exits = self.final_exits();
        let last_week = u32::MAX;

        let still_in: Vec<ContestantId> = self
            .base
            .keys()
            .copied()
            .filter(|id| !placements.contains_key(id))
            .filter(|id| !exits.contains_key(id))
            .filter(|id| self.status_as_of_week(*id, last_week).active)
            .collect();
        if !still_in.is_empty() {
            for id in &still_in {
                placements.insert(*id, next);
            }
            next = next.saturating_add(u32::try_from(still_in.len()).unwrap_or(u32::MAX));
        }

        let mut departed: Vec<(ContestantId, usize)> = exits
            .into_iter()
            .filter(|(id, _)| !placements.contains_key(id))
            .collect();
        departed.sort_by(|a, b| b.1.cmp(&a.1));
        for (id, _) in departed {
            placements.insert(id, next);
            next = next.saturating_add(1);
        }

        for id in self.base.keys() {
            if !placements.contains_key(id) {
                placements.insert(*id, next);
            }
        }

        placements
    }
}
