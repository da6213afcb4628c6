//! Configuration management

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CADENCE_SECS, DEFAULT_LOOKAHEAD_DAYS, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_REMOTE_TIMEOUT_SECS, DEFAULT_TOLERANCE_MINUTES, DEFAULT_USER_AGENT, STORAGE_TIMEZONE,
};
use crate::errors::{Result, SlotwatchError};
use crate::types::{ExecutionMode, MatchPolicy, MatchPolicyKind};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Record store endpoint (PostgREST-compatible)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
}

/// Check pass and scheduler tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub storage_timezone: String,
    pub match_policy: MatchPolicyKind,
    pub tolerance_minutes: u32,
    pub cadence_seconds: u64,
    pub remote_timeout_seconds: u64,
    pub lookahead_days: u32,
    pub max_concurrency: usize,
    pub suppress_duplicates: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            storage_timezone: STORAGE_TIMEZONE.to_string(),
            match_policy: MatchPolicyKind::default(),
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            cadence_seconds: DEFAULT_CADENCE_SECS,
            remote_timeout_seconds: DEFAULT_REMOTE_TIMEOUT_SECS,
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            suppress_duplicates: true,
        }
    }
}

impl NotificationConfig {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy::from_kind(self.match_policy, self.tolerance_minutes)
    }

    pub fn storage_zone(&self) -> Result<Tz> {
        self.storage_timezone.parse::<Tz>().map_err(|_| {
            SlotwatchError::Config(format!("unknown storage timezone: {}", self.storage_timezone))
        })
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_seconds)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_seconds)
    }
}

/// Outbound delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub execution_mode: ExecutionMode,
    pub user_agent: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self { execution_mode: ExecutionMode::default(), user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

impl Config {
    /// Startup validation; anything returned here is fatal
    pub fn validate(&self) -> Result<()> {
        if self.store.base_url.trim().is_empty() {
            return Err(SlotwatchError::ConfigurationMissing("store.base_url".into()));
        }
        if self.store.api_key.trim().is_empty() {
            return Err(SlotwatchError::ConfigurationMissing("store.api_key".into()));
        }

        let notifications = &self.notifications;
        notifications.storage_zone()?;
        if notifications.cadence_seconds == 0 {
            return Err(SlotwatchError::Config("cadence_seconds must be positive".into()));
        }
        if notifications.remote_timeout_seconds == 0 {
            return Err(SlotwatchError::Config("remote_timeout_seconds must be positive".into()));
        }
        if notifications.max_concurrency == 0 {
            return Err(SlotwatchError::Config("max_concurrency must be positive".into()));
        }
        Ok(())
    }
}
