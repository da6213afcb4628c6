//! Interval scheduling for notification check passes
//!
//! The scheduler follows the runtime rules used across the adapters:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Structured tracing with [`SchedulerMetrics`] integration
//!
//! [`SchedulerMetrics`]: crate::observability::metrics::SchedulerMetrics

pub mod error;
pub mod jobs;
pub mod polling_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use jobs::{CalendarPollJob, CheckAllJob, PollJob};
pub use polling_scheduler::{PollingScheduler, PollingSchedulerConfig, SchedulerStatus};
