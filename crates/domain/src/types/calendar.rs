//! Calendar records as read from the record store
//!
//! Times on a [`TimeSlot`] are wall-clock values with no zone attached; they
//! only gain meaning when paired with the configured storage timezone.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::availability::AvailabilityStatus;
use crate::impl_domain_status_conversions;

/// A shared team calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
}

/// A recurring named slot ("Morning standup", 09:00-10:00)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    pub calendar_id: String,
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Role of a member inside a calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    #[default]
    Member,
}

impl_domain_status_conversions!(MemberRole {
    Admin => "admin",
    Member => "member",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub calendar_id: String,
    pub name: String,
    #[serde(default)]
    pub role: MemberRole,
}

/// One member's answer for one slot on one date
///
/// At most one entry exists per `(member_id, time_slot_id, date)`. When a
/// reader sees more than one, the later entry wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub member_id: String,
    pub time_slot_id: String,
    pub date: NaiveDate,
    pub status: AvailabilityStatus,
}

impl ScheduleEntry {
    /// Whether this entry answers for the given slot and date
    pub fn applies_to(&self, time_slot_id: &str, date: NaiveDate) -> bool {
        self.time_slot_id == time_slot_id && self.date == date
    }
}
