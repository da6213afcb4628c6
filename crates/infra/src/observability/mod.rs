//! Observability for the polling loop
//!
//! Metrics are kept in-process and surfaced through structured logs. All
//! record methods return `MetricsResult<()>` so callers log and move on when a
//! metric cannot be recorded.
//!
//! Locks recover from poisoning instead of panicking:
//!
//! ```rust
//! use std::sync::Mutex;
//!
//! let mutex = Mutex::new(0u64);
//! let guard = match mutex.lock() {
//!     Ok(guard) => guard,
//!     Err(poison_err) => {
//!         tracing::warn!("Mutex poisoned, recovering");
//!         poison_err.into_inner()
//!     }
//! };
//! assert_eq!(*guard, 0);
//! ```

pub mod metrics;

/// Metrics error type
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Empty data set - cannot calculate aggregate metric
    #[error("Empty data: cannot calculate {metric}")]
    EmptyData {
        /// Metric name that failed (e.g., "P95", "P50")
        metric: &'static str,
    },
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
