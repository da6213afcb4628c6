//! Availability status and derived team snapshots

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// A member's answer for a slot on a date
///
/// Unknown or missing persisted values deserialize to [`AvailabilityStatus::Unset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum AvailabilityStatus {
    Available,
    Maybe,
    Unavailable,
    #[default]
    Unset,
}

impl_domain_status_conversions!(AvailabilityStatus {
    Available => "available",
    Maybe => "maybe",
    Unavailable => "unavailable",
    Unset => "unset",
});

impl AvailabilityStatus {
    /// Next status in the click cycle: unset, available, maybe, unavailable, unset
    pub fn next(self) -> Self {
        match self {
            Self::Unset => Self::Available,
            Self::Available => Self::Maybe,
            Self::Maybe => Self::Unavailable,
            Self::Unavailable => Self::Unset,
        }
    }

    /// Maps a raw stored value, tolerating nulls and unknown strings
    pub fn from_persisted(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }

    /// Human label shown next to a slot
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Maybe => "Maybe",
            Self::Unavailable => "Unavailable",
            Self::Unset => "Click to set",
        }
    }
}

impl From<Option<String>> for AvailabilityStatus {
    fn from(raw: Option<String>) -> Self {
        Self::from_persisted(raw.as_deref())
    }
}

/// Coarse bucket for a weighted availability percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    None,
}

impl_domain_status_conversions!(AvailabilityLevel {
    Excellent => "excellent",
    Good => "good",
    Fair => "fair",
    Poor => "poor",
    None => "none",
});

impl AvailabilityLevel {
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            100.. => Self::Excellent,
            80..=99 => Self::Good,
            50..=79 => Self::Fair,
            1..=49 => Self::Poor,
            0 => Self::None,
        }
    }
}

/// Team-wide counts for one slot on one date
///
/// `available_count + maybe_count + unavailable_count <= total_count`; the
/// remainder are members who have not answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    pub available_count: u32,
    pub maybe_count: u32,
    pub unavailable_count: u32,
    pub total_count: u32,
    pub percentage: u8,
}

impl AvailabilitySnapshot {
    /// Every member is available, and there is at least one member
    pub fn is_fully_available(&self) -> bool {
        self.total_count > 0 && self.available_count == self.total_count
    }

    pub fn unanswered_count(&self) -> u32 {
        self.total_count
            .saturating_sub(self.available_count + self.maybe_count + self.unavailable_count)
    }

    pub fn level(&self) -> AvailabilityLevel {
        AvailabilityLevel::from_percentage(self.percentage)
    }
}
