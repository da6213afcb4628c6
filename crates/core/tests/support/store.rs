use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use slotwatch_core::RecordStore;
use slotwatch_domain::{
    Calendar, Member, NotificationSubscription, Result as DomainResult, ScheduleEntry,
    SlotwatchError, TimeSlot,
};

#[derive(Default)]
struct Records {
    calendars: Vec<Calendar>,
    subscriptions: Vec<NotificationSubscription>,
    members: Vec<Member>,
    slots: Vec<TimeSlot>,
    entries: Vec<ScheduleEntry>,
}

/// In-memory mock for `RecordStore`.
///
/// `list_subscriptions` returns every subscription regardless of the
/// requested flag so tests can check that the service filters on its own.
#[derive(Default, Clone)]
pub struct MockRecordStore {
    records: Arc<Mutex<Records>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
    pub member_reads: Arc<Mutex<usize>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(self, id: &str, name: &str) -> Self {
        self.records.lock().unwrap().calendars.push(Calendar { id: id.into(), name: name.into() });
        self
    }

    pub fn with_subscription(self, subscription: NotificationSubscription) -> Self {
        self.records.lock().unwrap().subscriptions.push(subscription);
        self
    }

    pub fn with_member(self, member: Member) -> Self {
        self.records.lock().unwrap().members.push(member);
        self
    }

    pub fn with_slot(self, slot: TimeSlot) -> Self {
        self.records.lock().unwrap().slots.push(slot);
        self
    }

    pub fn with_entry(self, entry: ScheduleEntry) -> Self {
        self.records.lock().unwrap().entries.push(entry);
        self
    }

    /// Member reads for this calendar fail with `UpstreamUnavailable`
    pub fn failing_for(self, calendar_id: &str) -> Self {
        self.failing.lock().unwrap().insert(calendar_id.into());
        self
    }

    /// Every per-calendar read sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn slot_calendar(&self, slot_id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .slots
            .iter()
            .find(|slot| slot.id == slot_id)
            .map(|slot| slot.calendar_id.clone())
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn list_subscriptions(&self, _enabled: bool) -> DomainResult<Vec<NotificationSubscription>> {
        Ok(self.records.lock().unwrap().subscriptions.clone())
    }

    async fn find_calendar(&self, calendar_id: &str) -> DomainResult<Option<Calendar>> {
        Ok(self.records.lock().unwrap().calendars.iter().find(|c| c.id == calendar_id).cloned())
    }

    async fn list_members(&self, calendar_id: &str) -> DomainResult<Vec<Member>> {
        self.pause().await;
        *self.member_reads.lock().unwrap() += 1;
        if self.failing.lock().unwrap().contains(calendar_id) {
            return Err(SlotwatchError::UpstreamUnavailable("members query failed".into()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .members
            .iter()
            .filter(|m| m.calendar_id == calendar_id)
            .cloned()
            .collect())
    }

    async fn list_time_slots(&self, calendar_id: &str) -> DomainResult<Vec<TimeSlot>> {
        self.pause().await;
        Ok(self
            .records
            .lock()
            .unwrap()
            .slots
            .iter()
            .filter(|s| s.calendar_id == calendar_id)
            .cloned()
            .collect())
    }

    async fn list_entries(&self, calendar_id: &str, date: NaiveDate) -> DomainResult<Vec<ScheduleEntry>> {
        self.pause().await;
        let entries = self.records.lock().unwrap().entries.clone();
        Ok(entries
            .into_iter()
            .filter(|e| e.date == date)
            .filter(|e| self.slot_calendar(&e.time_slot_id).as_deref() == Some(calendar_id))
            .collect())
    }
}
