//! In-memory record store for local runs and tests

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use slotwatch_core::RecordStore;
use slotwatch_domain::{
    Calendar, Member, NotificationSubscription, Result, ScheduleEntry, TimeSlot,
};

#[derive(Default)]
struct Tables {
    calendars: Vec<Calendar>,
    subscriptions: Vec<NotificationSubscription>,
    members: Vec<Member>,
    time_slots: Vec<TimeSlot>,
    entries: Vec<ScheduleEntry>,
}

/// Cloneable handle over shared in-memory tables
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_calendar(&self, calendar: Calendar) {
        self.tables.write().calendars.push(calendar);
    }

    /// Inserts or replaces the subscription for its calendar
    pub fn upsert_subscription(&self, subscription: NotificationSubscription) {
        let mut tables = self.tables.write();
        tables.subscriptions.retain(|existing| existing.calendar_id != subscription.calendar_id);
        tables.subscriptions.push(subscription);
    }

    pub fn insert_member(&self, member: Member) {
        self.tables.write().members.push(member);
    }

    pub fn insert_time_slot(&self, slot: TimeSlot) {
        self.tables.write().time_slots.push(slot);
    }

    /// Records an answer; the latest answer per member, slot and date wins
    pub fn record_entry(&self, entry: ScheduleEntry) {
        let mut tables = self.tables.write();
        tables.entries.retain(|existing| {
            !(existing.member_id == entry.member_id
                && existing.time_slot_id == entry.time_slot_id
                && existing.date == entry.date)
        });
        tables.entries.push(entry);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_subscriptions(&self, enabled: bool) -> Result<Vec<NotificationSubscription>> {
        Ok(self
            .tables
            .read()
            .subscriptions
            .iter()
            .filter(|sub| sub.enabled == enabled)
            .cloned()
            .collect())
    }

    async fn find_calendar(&self, calendar_id: &str) -> Result<Option<Calendar>> {
        Ok(self.tables.read().calendars.iter().find(|c| c.id == calendar_id).cloned())
    }

    async fn list_members(&self, calendar_id: &str) -> Result<Vec<Member>> {
        Ok(self
            .tables
            .read()
            .members
            .iter()
            .filter(|m| m.calendar_id == calendar_id)
            .cloned()
            .collect())
    }

    async fn list_time_slots(&self, calendar_id: &str) -> Result<Vec<TimeSlot>> {
        let mut slots: Vec<TimeSlot> = self
            .tables
            .read()
            .time_slots
            .iter()
            .filter(|s| s.calendar_id == calendar_id)
            .cloned()
            .collect();
        slots.sort_by_key(|slot| slot.start);
        Ok(slots)
    }

    async fn list_entries(&self, calendar_id: &str, date: NaiveDate) -> Result<Vec<ScheduleEntry>> {
        let tables = self.tables.read();
        Ok(tables
            .entries
            .iter()
            .filter(|entry| entry.date == date)
            .filter(|entry| {
                tables
                    .time_slots
                    .iter()
                    .any(|slot| slot.id == entry.time_slot_id && slot.calendar_id == calendar_id)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use slotwatch_domain::AvailabilityStatus;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
    }

    fn slot(id: &str, calendar_id: &str, hour: u32) -> TimeSlot {
        TimeSlot {
            id: id.into(),
            calendar_id: calendar_id.into(),
            name: id.into(),
            start: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn subscriptions_filter_on_enabled_flag() {
        let store = InMemoryRecordStore::new();
        store.upsert_subscription(NotificationSubscription {
            calendar_id: "c1".into(),
            destination: "https://discord.com/api/webhooks/1/a".into(),
            trigger_time: "09:00".into(),
            enabled: true,
        });
        store.upsert_subscription(NotificationSubscription {
            calendar_id: "c2".into(),
            destination: "https://discord.com/api/webhooks/1/b".into(),
            trigger_time: "09:00".into(),
            enabled: false,
        });

        assert_eq!(store.list_subscriptions(true).await.unwrap().len(), 1);
        assert_eq!(store.list_subscriptions(false).await.unwrap()[0].calendar_id, "c2");
    }

    #[tokio::test]
    async fn entries_are_scoped_to_calendar_and_date_with_latest_answer() {
        let store = InMemoryRecordStore::new();
        store.insert_time_slot(slot("s1", "c1", 9));
        store.insert_time_slot(slot("s2", "c2", 9));
        for status in [AvailabilityStatus::Unavailable, AvailabilityStatus::Available] {
            store.record_entry(ScheduleEntry {
                member_id: "m1".into(),
                time_slot_id: "s1".into(),
                date: date(),
                status,
            });
        }
        store.record_entry(ScheduleEntry {
            member_id: "m1".into(),
            time_slot_id: "s2".into(),
            date: date(),
            status: AvailabilityStatus::Maybe,
        });

        let entries = store.list_entries("c1", date()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AvailabilityStatus::Available);
        assert!(store.list_entries("c1", date().succ_opt().unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn time_slots_come_back_in_start_order() {
        let store = InMemoryRecordStore::new();
        store.insert_time_slot(slot("late", "c1", 15));
        store.insert_time_slot(slot("early", "c1", 8));
        let ids: Vec<_> = store.list_time_slots("c1").await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }
}
