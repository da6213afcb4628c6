//! Team availability aggregation
//!
//! Scores a slot on a date from the team roster and the members' answers.
//! A `maybe` counts as half an `available`; members who never answered only
//! count toward the total.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use slotwatch_domain::{
    AvailabilityLevel, AvailabilitySnapshot, AvailabilityStatus, Member, ScheduleEntry, TimeSlot,
};

/// Weighted percentage `100 * (available + maybe / 2) / total`, rounded half up
///
/// Integer arithmetic only; `total == 0` yields 0.
pub fn percentage(available: u32, maybe: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let (available, maybe, total) = (u64::from(available), u64::from(maybe), u64::from(total));
    let scaled = (200 * available + 100 * maybe + total) / (2 * total);
    u8::try_from(scaled.min(100)).unwrap_or(100)
}

/// Aggregates answers for one slot on one date
///
/// `entries` must already be narrowed to that slot and date. When a member
/// appears more than once the last entry wins. Entries from people outside
/// `members` are ignored.
pub fn aggregate<'a, I>(members: &[Member], entries: I) -> AvailabilitySnapshot
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    let roster: HashSet<&str> = members.iter().map(|member| member.id.as_str()).collect();

    let mut latest: HashMap<&str, AvailabilityStatus> = HashMap::new();
    for entry in entries {
        if roster.contains(entry.member_id.as_str()) {
            latest.insert(entry.member_id.as_str(), entry.status);
        }
    }

    let mut snapshot = AvailabilitySnapshot {
        total_count: u32::try_from(roster.len()).unwrap_or(u32::MAX),
        ..AvailabilitySnapshot::default()
    };
    for status in latest.values() {
        match status {
            AvailabilityStatus::Available => snapshot.available_count += 1,
            AvailabilityStatus::Maybe => snapshot.maybe_count += 1,
            AvailabilityStatus::Unavailable => snapshot.unavailable_count += 1,
            AvailabilityStatus::Unset => {}
        }
    }
    snapshot.percentage =
        percentage(snapshot.available_count, snapshot.maybe_count, snapshot.total_count);
    snapshot
}

pub fn is_fully_available(snapshot: &AvailabilitySnapshot) -> bool {
    snapshot.is_fully_available()
}

/// A slot together with its score on a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotScore {
    pub slot: TimeSlot,
    pub date: NaiveDate,
    pub snapshot: AvailabilitySnapshot,
    pub level: AvailabilityLevel,
}

impl SlotScore {
    pub fn is_fully_available(&self) -> bool {
        self.snapshot.is_fully_available()
    }
}

/// Scores every slot on `date`, preserving slot order
pub fn score_slots(
    slots: &[TimeSlot],
    members: &[Member],
    entries: &[ScheduleEntry],
    date: NaiveDate,
) -> Vec<SlotScore> {
    slots
        .iter()
        .map(|slot| {
            let snapshot =
                aggregate(members, entries.iter().filter(|entry| entry.applies_to(&slot.id, date)));
            SlotScore { slot: slot.clone(), date, snapshot, level: snapshot.level() }
        })
        .collect()
}
