//! # Slotwatch Infrastructure
//!
//! Adapters implementing the ports defined in `slotwatch-core`.
//!
//! This crate contains:
//! - Configuration loading (environment, TOML/JSON files)
//! - HTTP client with timeouts and bounded retries
//! - PostgREST and in-memory record stores
//! - Discord webhook delivery
//! - The polling scheduler and its metrics
//!
//! ## Architecture
//! - Implements traits defined in `slotwatch-core`
//! - Contains all "impure" code (network, timers)

pub mod bootstrap;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod http;
pub mod observability;
pub mod scheduling;
pub mod store;

pub use bootstrap::{build_check_service, webhook_transport};
pub use delivery::DiscordWebhookTransport;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use scheduling::{
    CalendarPollJob, CheckAllJob, PollJob, PollingScheduler, PollingSchedulerConfig, SchedulerStatus,
};
pub use store::{InMemoryRecordStore, PostgrestRecordStore};
