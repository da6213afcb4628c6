use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use slotwatch_domain::{
    AvailabilityStatus, Member, MemberRole, NotificationSubscription, ScheduleEntry, TimeSlot,
};

/// 2024-01-15 18:01 in Tokyo
pub fn tokyo_evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 1, 0).unwrap()
}

pub fn tomorrow() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
}

pub fn subscription(calendar_id: &str, trigger: &str, enabled: bool) -> NotificationSubscription {
    NotificationSubscription {
        calendar_id: calendar_id.into(),
        destination: format!("https://discord.com/api/webhooks/1/{calendar_id}"),
        trigger_time: trigger.into(),
        enabled,
    }
}

pub fn member(calendar_id: &str, id: &str) -> Member {
    Member {
        id: id.into(),
        calendar_id: calendar_id.into(),
        name: id.to_uppercase(),
        role: MemberRole::Member,
    }
}

pub fn slot(calendar_id: &str, id: &str, name: &str, start: u32) -> TimeSlot {
    TimeSlot {
        id: id.into(),
        calendar_id: calendar_id.into(),
        name: name.into(),
        start: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
        end: NaiveTime::from_hms_opt(start + 1, 0, 0).unwrap(),
    }
}

pub fn answer(member_id: &str, slot_id: &str, date: NaiveDate, status: AvailabilityStatus) -> ScheduleEntry {
    ScheduleEntry {
        member_id: member_id.into(),
        time_slot_id: slot_id.into(),
        date,
        status,
    }
}
