//! Work units the polling scheduler can run on each tick

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use slotwatch_core::NotificationCheckService;
use slotwatch_domain::Result;
use tracing::{debug, info};

/// A unit of work executed once per scheduler tick
#[async_trait]
pub trait PollJob: Send + Sync {
    fn name(&self) -> &str;

    /// An error marks the tick as failed; the next tick still runs.
    async fn run(&self) -> Result<()>;
}

/// Checks every enabled subscription (server path)
pub struct CheckAllJob {
    service: Arc<NotificationCheckService>,
}

impl CheckAllJob {
    pub fn new(service: Arc<NotificationCheckService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PollJob for CheckAllJob {
    fn name(&self) -> &str {
        "check_all"
    }

    async fn run(&self) -> Result<()> {
        let results = self.service.check_all_for_lookahead().await?;
        let delivered = results.iter().filter(|result| result.delivered).count();
        if delivered > 0 {
            info!(delivered, "notifications delivered this tick");
        }
        Ok(())
    }
}

/// Watches a single calendar and forces a check once its trigger is due
///
/// Fires at most once per target date, even when the trigger window spans
/// several ticks.
pub struct CalendarPollJob {
    service: Arc<NotificationCheckService>,
    calendar_id: String,
    last_fired: Mutex<Option<NaiveDate>>,
}

impl CalendarPollJob {
    pub fn new(service: Arc<NotificationCheckService>, calendar_id: impl Into<String>) -> Self {
        Self { service, calendar_id: calendar_id.into(), last_fired: Mutex::new(None) }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }
}

#[async_trait]
impl PollJob for CalendarPollJob {
    fn name(&self) -> &str {
        "calendar_poll"
    }

    async fn run(&self) -> Result<()> {
        let (subscription, decision) = self.service.explain(&self.calendar_id).await?;
        if !subscription.enabled || !decision.due {
            debug!(calendar_id = %self.calendar_id, due = decision.due, enabled = subscription.enabled, "not firing");
            return Ok(());
        }

        let target_date = self.service.target_date();
        if *self.last_fired.lock() == Some(target_date) {
            debug!(calendar_id = %self.calendar_id, %target_date, "already fired for target date");
            return Ok(());
        }

        let result = self.service.check_one(&self.calendar_id).await?;
        if result.delivered {
            *self.last_fired.lock() = Some(target_date);
        }
        info!(
            calendar_id = %self.calendar_id,
            slots = result.slots_found,
            delivered = result.delivered,
            "calendar poll fired"
        );
        Ok(())
    }
}
