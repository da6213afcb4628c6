//! Transport-neutral notification payloads

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::availability::SlotScore;
use crate::time_codec::format_hhmm;

/// A slot on a date where every member is available
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifiedSlot {
    pub date: NaiveDate,
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QualifiedSlot {
    pub fn from_score(score: &SlotScore) -> Self {
        Self {
            date: score.date,
            name: score.slot.name.clone(),
            start: score.slot.start,
            end: score.slot.end,
        }
    }

    /// `• Standup (09:00 - 09:30)`
    pub fn line(&self) -> String {
        format!("• {} ({} - {})", self.name, format_hhmm(self.start), format_hhmm(self.end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Availability,
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub kind: PayloadKind,
    pub title: String,
    pub summary: String,
    pub calendar_name: String,
    pub grouped_slots: Vec<QualifiedSlot>,
    pub generated_at: DateTime<Utc>,
}

impl NotificationPayload {
    /// Payload announcing fully available slots
    ///
    /// `days_ahead` is the distance between the check date and the slot date
    /// and only affects wording.
    pub fn availability(
        calendar_name: impl Into<String>,
        slots: Vec<QualifiedSlot>,
        days_ahead: u32,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let count = slots.len();
        let plural = if count == 1 { "" } else { "s" };
        let title = match days_ahead {
            1 => "🎉 Tomorrow's 100% Team Availability!".to_string(),
            0 => "🎉 Today's 100% Team Availability!".to_string(),
            _ => "🎉 100% Team Availability!".to_string(),
        };
        Self {
            kind: PayloadKind::Availability,
            title,
            summary: format!("{count} time slot{plural} available {}", horizon(days_ahead)),
            calendar_name: calendar_name.into(),
            grouped_slots: slots,
            generated_at,
        }
    }

    /// Fixed payload used to verify a destination
    pub fn test(calendar_name: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            kind: PayloadKind::Test,
            title: "🧪 Test Notification".to_string(),
            summary: "This is a test notification from Team Schedule Manager.".to_string(),
            calendar_name: calendar_name.into(),
            grouped_slots: Vec::new(),
            generated_at,
        }
    }

    /// Slots grouped by date, dates ascending, slot order preserved
    pub fn groups(&self) -> BTreeMap<NaiveDate, Vec<&QualifiedSlot>> {
        let mut groups: BTreeMap<NaiveDate, Vec<&QualifiedSlot>> = BTreeMap::new();
        for slot in &self.grouped_slots {
            groups.entry(slot.date).or_default().push(slot);
        }
        groups
    }

    pub fn slot_count(&self) -> usize {
        self.grouped_slots.len()
    }
}

fn horizon(days_ahead: u32) -> String {
    match days_ahead {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {n} days"),
    }
}

/// `Tuesday, January 16, 2024`
pub fn date_heading(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn slot(day: u32, name: &str, start: (u32, u32), end: (u32, u32)) -> QualifiedSlot {
        QualifiedSlot {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            name: name.into(),
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn summary_pluralizes() {
        let one = NotificationPayload::availability("Team", vec![slot(16, "A", (9, 0), (10, 0))], 1, at());
        assert_eq!(one.summary, "1 time slot available tomorrow");
        assert_eq!(one.title, "🎉 Tomorrow's 100% Team Availability!");

        let two = NotificationPayload::availability(
            "Team",
            vec![slot(16, "A", (9, 0), (10, 0)), slot(16, "B", (13, 0), (14, 0))],
            3,
            at(),
        );
        assert_eq!(two.summary, "2 time slots available in 3 days");
    }

    #[test]
    fn groups_by_date_in_order() {
        let payload = NotificationPayload::availability(
            "Team",
            vec![
                slot(17, "Late", (18, 0), (19, 0)),
                slot(16, "Morning", (9, 0), (10, 0)),
                slot(16, "Lunch", (12, 0), (13, 0)),
            ],
            1,
            at(),
        );
        let groups = payload.groups();
        let dates: Vec<_> = groups.keys().copied().collect();
        assert_eq!(
            dates,
            vec![NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 17).unwrap()]
        );
        let first: Vec<_> = groups.values().next().unwrap().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(first, vec!["Morning", "Lunch"]);
    }

    #[test]
    fn slot_lines_and_headings() {
        assert_eq!(slot(16, "Standup", (9, 0), (9, 30)).line(), "• Standup (09:00 - 09:30)");
        assert_eq!(date_heading(NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()), "Tuesday, January 16, 2024");
    }

    #[test]
    fn test_payload_has_no_slots() {
        let payload = NotificationPayload::test("Team", at());
        assert_eq!(payload.kind, PayloadKind::Test);
        assert_eq!(payload.slot_count(), 0);
    }
}
