//! Notification subscription and delivery policy types

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TOLERANCE_MINUTES;
use crate::impl_domain_status_conversions;

/// A calendar's request to be told about fully available slots
///
/// `trigger_time` is an `HH:MM` wall-clock time in the storage timezone. It is
/// kept as the raw stored text so that a malformed value only fails the
/// subscription it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSubscription {
    pub calendar_id: String,
    pub destination: String,
    pub trigger_time: String,
    pub enabled: bool,
}

/// Whether unreachable transports may be reported as simulated success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Production,
    Test,
}

impl_domain_status_conversions!(ExecutionMode {
    Production => "production",
    Test => "test",
});

impl ExecutionMode {
    pub fn allows_simulated_delivery(self) -> bool {
        matches!(self, Self::Test)
    }
}

/// Configuration-level selector for [`MatchPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicyKind {
    Exact,
    #[default]
    Tolerance,
}

impl_domain_status_conversions!(MatchPolicyKind {
    Exact => "exact",
    Tolerance => "tolerance",
});

/// How "now" is compared against a subscription's trigger time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Fire only when hour and minute are equal
    ExactMinute,
    /// Fire when the minute-of-day distance is at most `minutes`
    ToleranceWindow { minutes: u32 },
}

impl MatchPolicy {
    pub fn from_kind(kind: MatchPolicyKind, tolerance_minutes: u32) -> Self {
        match kind {
            MatchPolicyKind::Exact => Self::ExactMinute,
            MatchPolicyKind::Tolerance => Self::ToleranceWindow { minutes: tolerance_minutes },
        }
    }

    /// Half-width of the firing window in minutes
    pub fn tolerance_minutes(&self) -> u32 {
        match self {
            Self::ExactMinute => 0,
            Self::ToleranceWindow { minutes } => *minutes,
        }
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::ToleranceWindow { minutes: DEFAULT_TOLERANCE_MINUTES }
    }
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactMinute => f.write_str("exact-minute"),
            Self::ToleranceWindow { minutes } => write!(f, "tolerance(±{minutes}m)"),
        }
    }
}
