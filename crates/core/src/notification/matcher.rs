//! Decides whether a subscription is due at a given wall-clock minute
//!
//! Comparison is on minute-of-day in the storage timezone. There is no
//! wraparound at midnight: 23:59 and 00:01 are 1438 minutes apart.

use chrono::{NaiveTime, Timelike};
use serde::Serialize;
use slotwatch_domain::{MatchPolicy, Result, SlotwatchError};

use crate::time_codec::{format_hhmm, parse_hhmm};

pub fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour() * 60 + time.minute())
}

/// True when `now` is within `tolerance_minutes` of `trigger`
pub fn should_fire(now: NaiveTime, trigger: NaiveTime, tolerance_minutes: u32) -> bool {
    (minute_of_day(now) - minute_of_day(trigger)).abs() <= i64::from(tolerance_minutes)
}

/// Parses a stored trigger time
///
/// Accepts `HH:MM`, and `HH:MM:SS` as returned by SQL `time` columns (seconds
/// are dropped).
pub fn parse_trigger_time(raw: &str) -> Result<NaiveTime> {
    if let Ok(time) = parse_hhmm(raw) {
        return Ok(time);
    }
    match (raw.get(..5), raw.get(5..)) {
        (Some(hhmm), Some(seconds))
            if seconds.len() == 3
                && seconds.starts_with(':')
                && seconds.bytes().skip(1).all(|b| b.is_ascii_digit()) =>
        {
            parse_hhmm(hhmm)
        }
        _ => Err(SlotwatchError::MalformedInput(format!("invalid trigger time: {raw:?}"))),
    }
}

/// Diagnostic view of one match evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchDecision {
    pub now: String,
    pub trigger: String,
    /// `now - trigger` in minutes of the day
    pub diff_minutes: i64,
    pub same_hour: bool,
    pub due: bool,
    pub policy: MatchPolicy,
}

/// Applies one [`MatchPolicy`] for a service instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationMatcher {
    policy: MatchPolicy,
}

impl NotificationMatcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn is_due(&self, now: NaiveTime, trigger: NaiveTime) -> bool {
        should_fire(now, trigger, self.policy.tolerance_minutes())
    }

    pub fn evaluate(&self, now: NaiveTime, trigger: NaiveTime) -> MatchDecision {
        MatchDecision {
            now: format_hhmm(now),
            trigger: format_hhmm(trigger),
            diff_minutes: minute_of_day(now) - minute_of_day(trigger),
            same_hour: now.hour() == trigger.hour(),
            due: self.is_due(now, trigger),
            policy: self.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn fires_inside_window_only() {
        assert!(should_fire(t(14, 30), t(14, 30), 2));
        assert!(should_fire(t(14, 32), t(14, 30), 2));
        assert!(should_fire(t(14, 28), t(14, 30), 2));
        assert!(!should_fire(t(14, 33), t(14, 30), 2));
    }

    #[test]
    fn window_edges_around_nine() {
        assert!(should_fire(t(8, 58), t(9, 0), 2));
        assert!(!should_fire(t(8, 57), t(9, 0), 2));
        assert!(!should_fire(t(9, 3), t(9, 0), 2));
    }

    #[test]
    fn no_wraparound_at_midnight() {
        assert!(!should_fire(t(23, 59), t(0, 1), 2));
        assert!(!should_fire(t(0, 1), t(23, 59), 2));
    }

    #[test]
    fn exact_policy_requires_same_minute() {
        let matcher = NotificationMatcher::new(MatchPolicy::ExactMinute);
        assert!(matcher.is_due(t(9, 0), t(9, 0)));
        assert!(!matcher.is_due(t(9, 1), t(9, 0)));
    }

    #[test]
    fn default_matcher_uses_two_minute_window() {
        let matcher = NotificationMatcher::default();
        assert!(matcher.is_due(t(9, 2), t(9, 0)));
        assert!(!matcher.is_due(t(9, 3), t(9, 0)));
    }

    #[test]
    fn evaluate_reports_signed_difference() {
        let decision = NotificationMatcher::default().evaluate(t(8, 58), t(9, 0));
        assert_eq!(decision.now, "08:58");
        assert_eq!(decision.trigger, "09:00");
        assert_eq!(decision.diff_minutes, -2);
        assert!(!decision.same_hour);
        assert!(decision.due);
    }

    #[test]
    fn trigger_time_accepts_sql_time_format() {
        assert_eq!(parse_trigger_time("09:00").unwrap(), t(9, 0));
        assert_eq!(parse_trigger_time("18:45:00").unwrap(), t(18, 45));
        assert!(parse_trigger_time("18:45:xx").is_err());
        assert!(parse_trigger_time("6pm").is_err());
        assert!(parse_trigger_time("").is_err());
    }
}
