//! # Slotwatch Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Timezone conversion of wall-clock `HH:MM` values
//! - Team availability aggregation
//! - Notification trigger matching
//! - Port interfaces (traits) for the record store, delivery and clock
//! - The notification check service
//!
//! ## Architecture Principles
//! - Only depends on `slotwatch-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod availability;
pub mod notification;
pub mod time_codec;

pub use availability::{aggregate, percentage, score_slots, SlotScore};
pub use notification::matcher::{should_fire, MatchDecision, NotificationMatcher};
pub use notification::message::{NotificationPayload, PayloadKind, QualifiedSlot};
pub use notification::ports::{
    Clock, DeliveryReceipt, NotificationTransport, RecordStore, SystemClock,
};
pub use notification::service::{
    CheckOutcome, CheckResult, CheckServiceConfig, NotificationCheckService, SkipReason,
};
