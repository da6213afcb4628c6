//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Time handling
pub const STORAGE_TIMEZONE: &str = "Asia/Tokyo";

// Notification matching
pub const DEFAULT_TOLERANCE_MINUTES: u32 = 2;
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 1;

// Polling and remote calls
pub const DEFAULT_CADENCE_SECS: u64 = 60;
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

// Delivery
pub const WEBHOOK_PATH_MARKER: &str = "/api/webhooks/";
pub const DEFAULT_USER_AGENT: &str = "slotwatch/0.1";
pub const EMBED_COLOR_AVAILABLE: u32 = 0x0010_b981;
pub const EMBED_COLOR_TEST: u32 = 0x003b_82f6;
pub const EMBED_FOOTER: &str = "Team Schedule Manager";
