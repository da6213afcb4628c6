use std::sync::Arc;

use anyhow::Result;
use slotwatch_infra::observability::metrics::SchedulerMetrics;
use slotwatch_infra::{CalendarPollJob, CheckAllJob, PollJob, PollingScheduler, PollingSchedulerConfig};
use tracing::info;

use crate::context::AppContext;

pub async fn run(ctx: AppContext, calendar: Option<String>) -> Result<()> {
    let job: Arc<dyn PollJob> = match calendar {
        Some(calendar_id) => Arc::new(CalendarPollJob::new(Arc::clone(&ctx.service), calendar_id)),
        None => Arc::new(CheckAllJob::new(Arc::clone(&ctx.service))),
    };

    let metrics = Arc::new(SchedulerMetrics::new());
    let mut scheduler = PollingScheduler::new(
        job,
        PollingSchedulerConfig::with_cadence(ctx.config.notifications.cadence()),
        Arc::clone(&metrics),
    );

    scheduler.start().await?;
    info!(
        execution_mode = ?ctx.config.delivery.execution_mode,
        policy = %ctx.service.matcher().policy(),
        "slotwatch running; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    scheduler.stop().await?;

    let snapshot = metrics.snapshot();
    info!(
        ticks = snapshot.ticks_started,
        completed = snapshot.ticks_completed,
        failed = snapshot.ticks_failed,
        skipped = snapshot.ticks_skipped,
        p95_ms = ?snapshot.p95_ms,
        "slotwatch stopped"
    );
    Ok(())
}
