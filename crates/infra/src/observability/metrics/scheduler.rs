//! Tick counters and timing for the polling scheduler
//!
//! ## Design
//! - **VecDeque ring buffer** for O(1) eviction of old durations
//! - **Poison-safe locking** with explicit match pattern (no .expect())
//! - **SeqCst ordering** for counters read together in a snapshot

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use crate::observability::{MetricsError, MetricsResult};

const MAX_SAMPLES: usize = 500;

/// Counters for scheduler ticks
#[derive(Debug)]
pub struct SchedulerMetrics {
    pub ticks_started: AtomicU64,
    pub ticks_completed: AtomicU64,
    pub ticks_failed: AtomicU64,
    /// Ticks dropped because the previous pass was still running
    pub ticks_skipped: AtomicU64,
    /// Pass durations in milliseconds (ring buffer)
    pub durations: Mutex<VecDeque<u64>>,
}

/// Point-in-time copy of [`SchedulerMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerSnapshot {
    pub ticks_started: u64,
    pub ticks_completed: u64,
    pub ticks_failed: u64,
    pub ticks_skipped: u64,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self {
            ticks_started: AtomicU64::new(0),
            ticks_completed: AtomicU64::new(0),
            ticks_failed: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            durations: Mutex::new(VecDeque::with_capacity(MAX_SAMPLES)),
        }
    }

    pub fn record_tick_started(&self) -> MetricsResult<()> {
        self.ticks_started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn record_tick_skipped(&self) -> MetricsResult<()> {
        self.ticks_skipped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Record a finished pass and its duration
    pub fn record_tick_finished(&self, duration: Duration, succeeded: bool) -> MetricsResult<()> {
        if succeeded {
            self.ticks_completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.ticks_failed.fetch_add(1, Ordering::SeqCst);
        }

        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let mut durations = match self.durations.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                tracing::warn!(
                    metric = "SchedulerMetrics::durations",
                    "Mutex poisoned during duration recording, recovering data"
                );
                poison_err.into_inner()
            }
        };
        durations.push_back(ms);
        if durations.len() > MAX_SAMPLES {
            durations.pop_front();
        }
        Ok(())
    }

    /// Returns `MetricsError::EmptyData` if no pass has finished.
    pub fn p50_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.50, "P50")
    }

    /// Returns `MetricsError::EmptyData` if no pass has finished.
    pub fn p95_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.95, "P95")
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            ticks_started: self.ticks_started.load(Ordering::SeqCst),
            ticks_completed: self.ticks_completed.load(Ordering::SeqCst),
            ticks_failed: self.ticks_failed.load(Ordering::SeqCst),
            ticks_skipped: self.ticks_skipped.load(Ordering::SeqCst),
            p50_ms: self.p50_ms().ok(),
            p95_ms: self.p95_ms().ok(),
        }
    }

    fn percentile(&self, percentile: f64, metric: &'static str) -> MetricsResult<u64> {
        let durations = match self.durations.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                tracing::warn!(
                    metric = "SchedulerMetrics::durations",
                    percentile,
                    "Mutex poisoned during percentile read, recovering"
                );
                poison_err.into_inner()
            }
        };

        if durations.is_empty() {
            return Err(MetricsError::EmptyData { metric });
        }

        let mut sorted: Vec<u64> = durations.iter().copied().collect();
        sorted.sort_unstable();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let index = ((sorted.len() as f64 * percentile) as usize).min(sorted.len() - 1);
        Ok(sorted[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_ticks_by_outcome() {
        let metrics = SchedulerMetrics::new();
        metrics.record_tick_started().unwrap();
        metrics.record_tick_started().unwrap();
        metrics.record_tick_skipped().unwrap();
        metrics.record_tick_finished(Duration::from_millis(10), true).unwrap();
        metrics.record_tick_finished(Duration::from_millis(30), false).unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks_started, 2);
        assert_eq!(snapshot.ticks_completed, 1);
        assert_eq!(snapshot.ticks_failed, 1);
        assert_eq!(snapshot.ticks_skipped, 1);
    }

    #[test]
    fn percentiles_need_samples() {
        let metrics = SchedulerMetrics::new();
        assert!(matches!(metrics.p50_ms(), Err(MetricsError::EmptyData { metric: "P50" })));
        assert_eq!(metrics.snapshot().p95_ms, None);

        for ms in [100, 200, 300, 400, 500] {
            metrics.record_tick_finished(Duration::from_millis(ms), true).unwrap();
        }
        // index = 5 * 0.5 = 2 -> 300; 5 * 0.95 = 4 -> 500
        assert_eq!(metrics.p50_ms().unwrap(), 300);
        assert_eq!(metrics.p95_ms().unwrap(), 500);
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let metrics = SchedulerMetrics::new();
        for ms in 0..(MAX_SAMPLES as u64 + 10) {
            metrics.record_tick_finished(Duration::from_millis(ms), true).unwrap();
        }
        let durations = match metrics.durations.lock() {
            Ok(guard) => guard,
            Err(e) => e.into_inner(),
        };
        assert_eq!(durations.len(), MAX_SAMPLES);
        assert_eq!(durations.front().copied(), Some(10));
    }
}
