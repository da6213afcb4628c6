//! Notification check service - one pass over the enabled subscriptions
//!
//! For each subscription: gate on the trigger time, load the target date's
//! slots, members and answers, keep the slots where every member is
//! available and deliver one grouped payload. A failure for one subscription
//! is recorded in its result and never aborts the rest of the pass.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use slotwatch_domain::constants::{
    DEFAULT_LOOKAHEAD_DAYS, DEFAULT_MAX_CONCURRENCY, DEFAULT_REMOTE_TIMEOUT_SECS,
};
use slotwatch_domain::{
    Member, MatchPolicy, NotificationConfig, NotificationSubscription, Result, ScheduleEntry,
    SlotwatchError, TimeSlot,
};
use tracing::{debug, info, instrument, warn};

use super::matcher::{parse_trigger_time, MatchDecision, NotificationMatcher};
use super::message::{NotificationPayload, QualifiedSlot};
use super::ports::{Clock, DeliveryReceipt, NotificationTransport, RecordStore, SystemClock};
use crate::availability::score_slots;
use crate::time_codec::{date_in_zone, format_hhmm, time_of_day};

const UNKNOWN_CALENDAR: &str = "Unknown Calendar";

/// Tuning for [`NotificationCheckService`]
#[derive(Debug, Clone)]
pub struct CheckServiceConfig {
    pub storage_zone: Tz,
    pub policy: MatchPolicy,
    pub lookahead_days: u32,
    pub remote_timeout: Duration,
    pub max_concurrency: usize,
    pub suppress_duplicates: bool,
}

impl Default for CheckServiceConfig {
    fn default() -> Self {
        Self {
            storage_zone: chrono_tz::Asia::Tokyo,
            policy: MatchPolicy::default(),
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            suppress_duplicates: true,
        }
    }
}

impl CheckServiceConfig {
    pub fn from_config(config: &NotificationConfig) -> Result<Self> {
        Ok(Self {
            storage_zone: config.storage_zone()?,
            policy: config.policy(),
            lookahead_days: config.lookahead_days,
            remote_timeout: config.remote_timeout(),
            max_concurrency: config.max_concurrency.max(1),
            suppress_duplicates: config.suppress_duplicates,
        })
    }
}

/// Why a subscription was not evaluated on this pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NotDue { now: String, trigger: String, zone: String },
    AlreadyDelivered,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDue { now, trigger, zone } => {
                write!(f, "not due. Current: {now} {zone}, Target: {trigger} {zone}")
            }
            Self::AlreadyDelivered => f.write_str("already delivered for this date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    Skipped { reason: SkipReason },
    NoMembers,
    NoQualifyingSlots,
    Delivered { simulated: bool },
    Rejected { status: u16, reason: String },
    Failed { kind: String, message: String },
}

impl CheckOutcome {
    fn from_error(err: &SlotwatchError) -> Self {
        match err {
            SlotwatchError::DestinationRejected { status, reason } => {
                Self::Rejected { status: *status, reason: reason.clone() }
            }
            other => Self::Failed { kind: other.kind().to_string(), message: other.to_string() },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Rejected { .. })
    }
}

/// Result of checking one subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub calendar_id: String,
    /// Resolved only once the subscription passed its trigger gate
    pub calendar_name: Option<String>,
    pub date_checked: Option<NaiveDate>,
    pub slots_found: usize,
    pub delivered: bool,
    pub outcome: CheckOutcome,
    pub slots: Vec<QualifiedSlot>,
}

impl CheckResult {
    fn new(calendar_id: &str, outcome: CheckOutcome) -> Self {
        Self {
            calendar_id: calendar_id.to_string(),
            calendar_name: None,
            date_checked: None,
            slots_found: 0,
            delivered: false,
            outcome,
            slots: Vec::new(),
        }
    }
}

/// Orchestrates check passes against a record store and a transport
pub struct NotificationCheckService {
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn NotificationTransport>,
    clock: Arc<dyn Clock>,
    matcher: NotificationMatcher,
    config: CheckServiceConfig,
    delivered: Mutex<HashSet<(String, NaiveDate)>>,
}

impl NotificationCheckService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn NotificationTransport>,
        config: CheckServiceConfig,
    ) -> Self {
        Self {
            store,
            transport,
            clock: Arc::new(SystemClock),
            matcher: NotificationMatcher::new(config.policy),
            config,
            delivered: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the wall clock (tests, replays)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn matcher(&self) -> NotificationMatcher {
        self.matcher
    }

    pub fn config(&self) -> &CheckServiceConfig {
        &self.config
    }

    /// Today in the storage zone plus the configured lookahead
    pub fn target_date(&self) -> NaiveDate {
        let today = date_in_zone(self.config.storage_zone, self.clock.now());
        today.checked_add_days(Days::new(u64::from(self.config.lookahead_days))).unwrap_or(today)
    }

    /// Current minute in the storage zone
    pub fn storage_time(&self) -> NaiveTime {
        time_of_day(self.config.storage_zone, self.clock.now())
    }

    pub async fn check_all_for_lookahead(&self) -> Result<Vec<CheckResult>> {
        self.check_all(self.target_date()).await
    }

    /// Checks every enabled subscription that is due now
    ///
    /// Fails only when the subscription list itself cannot be read.
    #[instrument(skip(self), fields(policy = %self.matcher.policy()))]
    pub async fn check_all(&self, target_date: NaiveDate) -> Result<Vec<CheckResult>> {
        let subscriptions =
            self.bounded("list_subscriptions", self.store.list_subscriptions(true)).await?;
        let now = self.storage_time();
        self.prune_ledger(target_date);

        let enabled: Vec<_> = subscriptions.into_iter().filter(|sub| sub.enabled).collect();
        debug!(count = enabled.len(), now = %format_hhmm(now), "checking subscriptions");

        let results: Vec<CheckResult> = stream::iter(enabled)
            .map(|subscription| self.check_due(subscription, now, target_date))
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let delivered = results.iter().filter(|result| result.delivered).count();
        let failed = results.iter().filter(|result| result.outcome.is_failure()).count();
        info!(
            checked = results.len(),
            delivered,
            failed,
            date = %target_date,
            "notification check pass complete"
        );
        Ok(results)
    }

    /// Evaluates one calendar immediately, bypassing the trigger gate and the
    /// duplicate ledger
    #[instrument(skip(self))]
    pub async fn check_one(&self, calendar_id: &str) -> Result<CheckResult> {
        let subscription = self.enabled_subscription(calendar_id).await?;
        let target_date = self.target_date();
        Ok(self.evaluate(&subscription, target_date, false).await)
    }

    /// Sends the fixed test payload to a calendar's destination
    #[instrument(skip(self))]
    pub async fn send_test(&self, calendar_id: &str) -> Result<DeliveryReceipt> {
        let subscription = self.enabled_subscription(calendar_id).await?;
        let calendar_name = self.calendar_name(calendar_id).await?;
        let payload = NotificationPayload::test(calendar_name, self.clock.now());
        self.bounded("deliver", self.transport.deliver(&subscription.destination, &payload)).await
    }

    /// Match diagnostics for a calendar's subscription at the current minute
    pub async fn explain(&self, calendar_id: &str) -> Result<(NotificationSubscription, MatchDecision)> {
        let subscription = match self.find_subscription(calendar_id, true).await? {
            Some(found) => found,
            None => self.find_subscription(calendar_id, false).await?.ok_or_else(|| {
                SlotwatchError::NotFound(format!("no subscription for calendar {calendar_id}"))
            })?,
        };
        let trigger = parse_trigger_time(&subscription.trigger_time)?;
        let decision = self.matcher.evaluate(self.storage_time(), trigger);
        Ok((subscription, decision))
    }

    async fn check_due(
        &self,
        subscription: NotificationSubscription,
        now: NaiveTime,
        target_date: NaiveDate,
    ) -> CheckResult {
        let trigger = match parse_trigger_time(&subscription.trigger_time) {
            Ok(trigger) => trigger,
            Err(err) => {
                warn!(calendar_id = %subscription.calendar_id, error = %err, "bad trigger time");
                return CheckResult::new(&subscription.calendar_id, CheckOutcome::from_error(&err));
            }
        };

        if !self.matcher.is_due(now, trigger) {
            let reason = SkipReason::NotDue {
                now: format_hhmm(now),
                trigger: format_hhmm(trigger),
                zone: self.config.storage_zone.name().to_string(),
            };
            debug!(calendar_id = %subscription.calendar_id, %reason, "skipping");
            return CheckResult::new(&subscription.calendar_id, CheckOutcome::Skipped { reason });
        }

        if self.already_delivered(&subscription.calendar_id, target_date) {
            let mut result = CheckResult::new(
                &subscription.calendar_id,
                CheckOutcome::Skipped { reason: SkipReason::AlreadyDelivered },
            );
            result.date_checked = Some(target_date);
            return result;
        }

        self.evaluate(&subscription, target_date, true).await
    }

    /// `record` is false for forced checks, which leave the duplicate ledger alone
    async fn evaluate(
        &self,
        subscription: &NotificationSubscription,
        target_date: NaiveDate,
        record: bool,
    ) -> CheckResult {
        let calendar_id = subscription.calendar_id.as_str();
        let mut result = CheckResult::new(calendar_id, CheckOutcome::NoQualifyingSlots);
        result.date_checked = Some(target_date);

        let calendar_name = match self.calendar_name(calendar_id).await {
            Ok(name) => name,
            Err(err) => return self.fail(result, &err),
        };
        result.calendar_name = Some(calendar_name.clone());

        let (slots, members, entries) = match self.gather(calendar_id, target_date).await {
            Ok(data) => data,
            Err(err) => return self.fail(result, &err),
        };

        if members.is_empty() {
            info!(calendar_id, "no members, nothing to check");
            result.outcome = CheckOutcome::NoMembers;
            return result;
        }

        let qualifying: Vec<QualifiedSlot> = score_slots(&slots, &members, &entries, target_date)
            .iter()
            .filter(|score| score.is_fully_available())
            .map(QualifiedSlot::from_score)
            .collect();
        result.slots_found = qualifying.len();
        debug!(
            calendar_id,
            slots = slots.len(),
            members = members.len(),
            qualifying = qualifying.len(),
            "scored slots"
        );

        if qualifying.is_empty() {
            return result;
        }

        result.slots = qualifying.clone();
        let payload = NotificationPayload::availability(
            calendar_name,
            qualifying,
            self.config.lookahead_days,
            self.clock.now(),
        );
        match self.bounded("deliver", self.transport.deliver(&subscription.destination, &payload)).await
        {
            Ok(receipt) => {
                if record {
                    self.record_delivery(calendar_id, target_date);
                }
                info!(calendar_id, slots = result.slots_found, simulated = receipt.simulated, "notification delivered");
                result.delivered = true;
                result.outcome = CheckOutcome::Delivered { simulated: receipt.simulated };
                result
            }
            Err(err) => self.fail(result, &err),
        }
    }

    async fn gather(
        &self,
        calendar_id: &str,
        date: NaiveDate,
    ) -> Result<(Vec<TimeSlot>, Vec<Member>, Vec<ScheduleEntry>)> {
        tokio::try_join!(
            self.bounded("list_time_slots", self.store.list_time_slots(calendar_id)),
            self.bounded("list_members", self.store.list_members(calendar_id)),
            self.bounded("list_entries", self.store.list_entries(calendar_id, date)),
        )
    }

    async fn calendar_name(&self, calendar_id: &str) -> Result<String> {
        let calendar = self.bounded("find_calendar", self.store.find_calendar(calendar_id)).await?;
        Ok(calendar.map_or_else(|| UNKNOWN_CALENDAR.to_string(), |calendar| calendar.name))
    }

    async fn enabled_subscription(&self, calendar_id: &str) -> Result<NotificationSubscription> {
        if calendar_id.trim().is_empty() {
            return Err(SlotwatchError::MalformedInput("calendar id is required".into()));
        }
        self.find_subscription(calendar_id, true).await?.ok_or_else(|| {
            SlotwatchError::NotFound(format!("no enabled subscription for calendar {calendar_id}"))
        })
    }

    async fn find_subscription(
        &self,
        calendar_id: &str,
        enabled: bool,
    ) -> Result<Option<NotificationSubscription>> {
        let subscriptions =
            self.bounded("list_subscriptions", self.store.list_subscriptions(enabled)).await?;
        Ok(subscriptions
            .into_iter()
            .find(|sub| sub.calendar_id == calendar_id && sub.enabled == enabled))
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.config.remote_timeout;
        tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(SlotwatchError::UpstreamUnavailable(format!(
                "{operation} timed out after {}ms",
                limit.as_millis()
            )))
        })
    }

    fn fail(&self, mut result: CheckResult, err: &SlotwatchError) -> CheckResult {
        warn!(
            calendar_id = %result.calendar_id,
            error_kind = err.kind(),
            error = %err,
            "subscription check failed"
        );
        result.outcome = CheckOutcome::from_error(err);
        result.delivered = false;
        result
    }

    fn already_delivered(&self, calendar_id: &str, date: NaiveDate) -> bool {
        self.config.suppress_duplicates
            && self.delivered.lock().contains(&(calendar_id.to_string(), date))
    }

    fn record_delivery(&self, calendar_id: &str, date: NaiveDate) {
        if self.config.suppress_duplicates {
            self.delivered.lock().insert((calendar_id.to_string(), date));
        }
    }

    fn prune_ledger(&self, target_date: NaiveDate) {
        self.delivered.lock().retain(|(_, date)| *date >= target_date);
    }
}
