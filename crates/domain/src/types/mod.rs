//! Domain types and models

pub mod availability;
pub mod calendar;
pub mod notification;

pub use availability::{AvailabilityLevel, AvailabilitySnapshot, AvailabilityStatus};
pub use calendar::{Calendar, Member, MemberRole, ScheduleEntry, TimeSlot};
pub use notification::{ExecutionMode, MatchPolicy, MatchPolicyKind, NotificationSubscription};
