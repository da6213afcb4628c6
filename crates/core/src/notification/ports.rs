//! Port interfaces for the notification check service

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use slotwatch_domain::{
    Calendar, Member, NotificationSubscription, Result, ScheduleEntry, TimeSlot,
};

use super::message::NotificationPayload;

/// Read-only access to calendar data
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Subscriptions whose `enabled` flag equals `enabled`
    async fn list_subscriptions(&self, enabled: bool) -> Result<Vec<NotificationSubscription>>;

    async fn find_calendar(&self, calendar_id: &str) -> Result<Option<Calendar>>;

    async fn list_members(&self, calendar_id: &str) -> Result<Vec<Member>>;

    async fn list_time_slots(&self, calendar_id: &str) -> Result<Vec<TimeSlot>>;

    /// Schedule entries for a calendar on one date
    async fn list_entries(&self, calendar_id: &str, date: NaiveDate) -> Result<Vec<ScheduleEntry>>;
}

/// Outcome of a delivery the transport considers successful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeliveryReceipt {
    /// Transport was unreachable and the send was simulated (test mode only)
    pub simulated: bool,
    pub status: Option<u16>,
}

impl DeliveryReceipt {
    pub fn delivered(status: u16) -> Self {
        Self { simulated: false, status: Some(status) }
    }

    pub fn simulated() -> Self {
        Self { simulated: true, status: None }
    }
}

/// Sends a payload to a destination
///
/// Implementations return `UpstreamUnavailable` when the destination cannot
/// be reached and `DestinationRejected` when it answers with a refusal.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn deliver(
        &self,
        destination: &str,
        payload: &NotificationPayload,
    ) -> Result<DeliveryReceipt>;
}

/// Source of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
