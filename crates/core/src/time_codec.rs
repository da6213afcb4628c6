//! Wall-clock `HH:MM` conversion between IANA timezones
//!
//! Every conversion needs a reference instant to pick the calendar day the
//! wall-clock time belongs to, since offsets move across DST transitions.
//! The `*_at` variants take that instant explicitly; the plain variants use
//! the current time.
//!
//! Conversions are fail-soft: a malformed time or an unknown zone yields the
//! input unchanged and a debug log line.

use chrono::{DateTime, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc};
use chrono_tz::{OffsetComponents, Tz};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use slotwatch_domain::{Result, SlotwatchError};
use tracing::{debug, warn};

static HHMM_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d{2}:\d{2}$").ok());

/// Parses a strict `HH:MM` string (two digits each, 00-23 and 00-59)
pub fn parse_hhmm(time: &str) -> Result<NaiveTime> {
    let well_formed = HHMM_PATTERN.as_ref().is_some_and(|pattern| pattern.is_match(time));
    if !well_formed {
        return Err(SlotwatchError::MalformedInput(format!("expected HH:MM, got {time:?}")));
    }

    let (hour, minute) = time
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
        .ok_or_else(|| SlotwatchError::MalformedInput(format!("expected HH:MM, got {time:?}")))?;

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| SlotwatchError::MalformedInput(format!("time out of range: {time}")))
}

pub fn format_hhmm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

pub fn parse_zone(zone: &str) -> Result<Tz> {
    zone.parse::<Tz>()
        .map_err(|_| SlotwatchError::MalformedInput(format!("unknown timezone: {zone}")))
}

/// Converts `time` from `from` to `to` using today's date in `from`
pub fn convert_time(time: &str, from: &str, to: &str) -> String {
    convert_time_at(time, from, to, Utc::now())
}

/// Converts `time` from `from` to `to` on the day `reference` falls on in `from`
///
/// Same-zone conversion returns the input without any arithmetic. Ambiguous
/// local times (DST fall-back) resolve to the earlier instant; times inside a
/// DST gap use the offset in effect at `reference`.
pub fn convert_time_at(time: &str, from: &str, to: &str, reference: DateTime<Utc>) -> String {
    if from == to {
        return time.to_string();
    }

    match try_convert(time, from, to, reference) {
        Ok(converted) => converted,
        Err(err) => {
            debug!(time, from, to, error = %err, "time conversion failed, returning input");
            time.to_string()
        }
    }
}

fn try_convert(time: &str, from: &str, to: &str, reference: DateTime<Utc>) -> Result<String> {
    let wall = parse_hhmm(time)?;
    let from_tz = parse_zone(from)?;
    let to_tz = parse_zone(to)?;

    let day = reference.with_timezone(&from_tz).date_naive();
    let instant = resolve_local(from_tz, day, wall, reference);
    Ok(format_hhmm(instant.with_timezone(&to_tz).time()))
}

fn resolve_local(zone: Tz, day: NaiveDate, wall: NaiveTime, reference: DateTime<Utc>) -> DateTime<Utc> {
    let local = day.and_time(wall);
    if let Some(resolved) = zone.from_local_datetime(&local).earliest() {
        return resolved.with_timezone(&Utc);
    }

    // DST gap: the wall time never occurs on this day
    let offset_secs = zone.offset_from_utc_datetime(&reference.naive_utc()).fix().local_minus_utc();
    Utc.from_utc_datetime(&(local - chrono::Duration::seconds(i64::from(offset_secs))))
}

/// Current wall-clock time in `zone` as `HH:MM`
///
/// An unknown zone falls back to UTC with a warning.
pub fn current_time(zone: &str) -> String {
    current_time_at(zone, Utc::now())
}

pub fn current_time_at(zone: &str, now: DateTime<Utc>) -> String {
    match parse_zone(zone) {
        Ok(tz) => format_hhmm(now.with_timezone(&tz).time()),
        Err(_) => {
            warn!(zone, "unknown timezone, reporting UTC time");
            format_hhmm(now.time())
        }
    }
}

/// Signed UTC offset of `zone` in minutes right now; 0 for an unknown zone
pub fn offset_minutes(zone: &str) -> i32 {
    offset_minutes_at(zone, Utc::now())
}

pub fn offset_minutes_at(zone: &str, at: DateTime<Utc>) -> i32 {
    parse_zone(zone).map_or(0, |tz| zone_offset_minutes(tz, at))
}

fn zone_offset_minutes(tz: Tz, at: DateTime<Utc>) -> i32 {
    tz.offset_from_utc_datetime(&at.naive_utc()).fix().local_minus_utc() / 60
}

/// Offset and DST state of a zone at an instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneInfo {
    pub zone: String,
    pub offset_minutes: i32,
    pub is_dst: bool,
}

impl TimezoneInfo {
    /// `UTC+09:00` style label
    pub fn utc_label(&self) -> String {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.unsigned_abs();
        format!("UTC{sign}{:02}:{:02}", abs / 60, abs % 60)
    }
}

pub fn timezone_info(zone: &str, at: DateTime<Utc>) -> Result<TimezoneInfo> {
    let tz = parse_zone(zone)?;
    let offset = tz.offset_from_utc_datetime(&at.naive_utc());
    Ok(TimezoneInfo {
        zone: zone.to_string(),
        offset_minutes: offset.fix().local_minus_utc() / 60,
        is_dst: offset.dst_offset() != chrono::Duration::zero(),
    })
}

/// `"Asia/Tokyo (UTC+09:00)"`, or just the input for an unknown zone
pub fn format_timezone_info(zone: &str, at: DateTime<Utc>) -> String {
    match timezone_info(zone, at) {
        Ok(info) => format!("{} ({})", info.zone, info.utc_label()),
        Err(_) => zone.to_string(),
    }
}

/// Forward and backward conversion of one value, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub input: String,
    pub from: String,
    pub to: String,
    pub converted: String,
    pub back_converted: String,
    pub is_round_trip: bool,
}

pub fn debug_conversion(time: &str, from: &str, to: &str, at: DateTime<Utc>) -> ConversionReport {
    let converted = convert_time_at(time, from, to, at);
    let back_converted = convert_time_at(&converted, to, from, at);
    ConversionReport {
        input: time.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        is_round_trip: back_converted == time,
        converted,
        back_converted,
    }
}

/// Wall-clock time of day in `zone` at `now`, truncated to the minute
pub fn time_of_day(zone: Tz, now: DateTime<Utc>) -> NaiveTime {
    let local = now.with_timezone(&zone).time();
    NaiveTime::from_hms_opt(local.hour(), local.minute(), 0).unwrap_or(local)
}

/// Calendar date in `zone` at `now`
pub fn date_in_zone(zone: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&zone).date_naive()
}
