//! Interval scheduler that drives a [`PollJob`].
//!
//! The first tick fires immediately after `start`, then once per cadence.
//! Each tick runs on its own task; a tick that arrives while the previous
//! one is still running is skipped and counted.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use slotwatch_infra::observability::metrics::SchedulerMetrics;
//! use slotwatch_infra::scheduling::{
//!     PollJob, PollingScheduler, PollingSchedulerConfig, SchedulerResult,
//! };
//!
//! struct NoopJob;
//!
//! #[async_trait]
//! impl PollJob for NoopJob {
//!     fn name(&self) -> &str {
//!         "noop"
//!     }
//!
//!     async fn run(&self) -> slotwatch_domain::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> SchedulerResult<()> {
//! let metrics = Arc::new(SchedulerMetrics::new());
//! let mut scheduler =
//!     PollingScheduler::new(Arc::new(NoopJob), PollingSchedulerConfig::default(), metrics);
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use slotwatch_domain::constants::DEFAULT_CADENCE_SECS;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn, Instrument};
use uuid::Uuid;

use super::jobs::PollJob;
use crate::observability::metrics::SchedulerMetrics;
use crate::observability::MetricsResult;
use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the polling scheduler
#[derive(Debug, Clone)]
pub struct PollingSchedulerConfig {
    /// Time between ticks
    pub cadence: Duration,
    /// How long `stop` waits for the timer task to exit
    pub join_timeout: Duration,
}

impl Default for PollingSchedulerConfig {
    fn default() -> Self {
        Self { cadence: Duration::from_secs(DEFAULT_CADENCE_SECS), join_timeout: Duration::from_secs(5) }
    }
}

impl PollingSchedulerConfig {
    pub fn with_cadence(cadence: Duration) -> Self {
        Self { cadence, ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub next_tick_at: Option<DateTime<Utc>>,
}

/// Everything the timer loop shares with the scheduler handle
struct TickContext {
    job: Arc<dyn PollJob>,
    metrics: Arc<SchedulerMetrics>,
    status: Arc<Mutex<SchedulerStatus>>,
    in_flight: Arc<AtomicBool>,
}

pub struct PollingScheduler {
    job: Arc<dyn PollJob>,
    config: PollingSchedulerConfig,
    metrics: Arc<SchedulerMetrics>,
    cancellation_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
    status: Arc<Mutex<SchedulerStatus>>,
    in_flight: Arc<AtomicBool>,
}

impl PollingScheduler {
    pub fn new(
        job: Arc<dyn PollJob>,
        config: PollingSchedulerConfig,
        metrics: Arc<SchedulerMetrics>,
    ) -> Self {
        Self {
            job,
            config,
            metrics,
            cancellation_token: CancellationToken::new(),
            task_handle: None,
            status: Arc::new(Mutex::new(SchedulerStatus::default())),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start ticking; restarts the timer if already running
    ///
    /// # Errors
    ///
    /// Propagates errors from the implicit `stop`.
    #[instrument(skip(self), fields(job = self.job.name()))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            debug!("Scheduler already running; restarting");
            self.stop().await?;
        }

        info!(cadence_secs = self.config.cadence.as_secs_f64(), "Starting polling scheduler");

        // Fresh token so the scheduler can be restarted after stop
        self.cancellation_token = CancellationToken::new();
        let cancel = self.cancellation_token.clone();
        let cadence = self.config.cadence;
        let context = TickContext {
            job: Arc::clone(&self.job),
            metrics: Arc::clone(&self.metrics),
            status: Arc::clone(&self.status),
            in_flight: Arc::clone(&self.in_flight),
        };

        {
            let mut status = self.status.lock();
            status.running = true;
            status.next_tick_at = Some(Utc::now());
        }

        self.task_handle = Some(tokio::spawn(async move {
            Self::tick_loop(context, cadence, cancel).await;
        }));

        Ok(())
    }

    /// Stop ticking. An in-flight tick is allowed to finish on its own.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` if the scheduler was never started or already
    /// stopped, and `Timeout` if the timer task does not exit in time.
    #[instrument(skip(self), fields(job = self.job.name()))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(handle) = self.task_handle.take() else {
            return Err(SchedulerError::NotRunning);
        };

        info!("Stopping polling scheduler");
        self.cancellation_token.cancel();

        let join_timeout = self.config.join_timeout;
        let joined = tokio::time::timeout(join_timeout, handle).await;
        *self.status.lock() = SchedulerStatus::default();
        joined.map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })??;

        info!("Polling scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn status(&self) -> SchedulerStatus {
        *self.status.lock()
    }

    pub fn metrics(&self) -> Arc<SchedulerMetrics> {
        Arc::clone(&self.metrics)
    }

    async fn tick_loop(context: TickContext, cadence: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Tick loop cancelled");
                    break;
                }
                _ = interval.tick() => {
                    context.status.lock().next_tick_at = chrono::Duration::from_std(cadence)
                        .ok()
                        .and_then(|step| Utc::now().checked_add_signed(step));
                    Self::dispatch(&context);
                }
            }
        }
    }

    fn dispatch(context: &TickContext) {
        if context.in_flight.swap(true, Ordering::SeqCst) {
            warn!(job = context.job.name(), "Previous tick still running; skipping");
            log_metric(context.metrics.record_tick_skipped(), "scheduler.tick.skipped");
            return;
        }

        let job = Arc::clone(&context.job);
        let metrics = Arc::clone(&context.metrics);
        let in_flight = Arc::clone(&context.in_flight);
        let tick_id = Uuid::new_v4();
        let span = tracing::info_span!("tick", %tick_id, job = job.name());

        tokio::spawn(
            async move {
                log_metric(metrics.record_tick_started(), "scheduler.tick.started");
                let started = Instant::now();
                // Inner task so a panicking job still releases the in-flight flag
                let run = tokio::spawn(async move { job.run().await }.in_current_span());
                let joined = run.await;
                let elapsed = started.elapsed();

                let succeeded = match joined {
                    Ok(Ok(())) => {
                        debug!(duration_ms = elapsed.as_millis(), "Tick completed");
                        true
                    }
                    Ok(Err(err)) => {
                        error!(error = %err, kind = err.kind(), duration_ms = elapsed.as_millis(), "Tick failed");
                        false
                    }
                    Err(err) => {
                        error!(error = %err, panicked = err.is_panic(), duration_ms = elapsed.as_millis(), "Tick aborted");
                        false
                    }
                };
                log_metric(metrics.record_tick_finished(elapsed, succeeded), "scheduler.tick.finished");
                in_flight.store(false, Ordering::SeqCst);
            }
            .instrument(span),
        );
    }
}

fn log_metric(result: MetricsResult<()>, metric: &'static str) {
    if let Err(err) = result {
        warn!(metric = metric, error = ?err, "Failed to record scheduler metric");
    }
}

/// Ensure the timer is cancelled when the scheduler is dropped
impl Drop for PollingScheduler {
    fn drop(&mut self) {
        if self.task_handle.is_some() && !self.cancellation_token.is_cancelled() {
            warn!("PollingScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
