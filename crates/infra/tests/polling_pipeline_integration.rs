//! Scheduler → check service → store → webhook, end to end

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use slotwatch_core::{CheckOutcome, CheckServiceConfig, Clock, NotificationCheckService};
use slotwatch_domain::{
    AvailabilityStatus, Calendar, DeliveryConfig, ExecutionMode, Member, MemberRole,
    NotificationSubscription, ScheduleEntry, TimeSlot,
};
use slotwatch_infra::observability::metrics::SchedulerMetrics;
use slotwatch_infra::{
    webhook_transport, CalendarPollJob, CheckAllJob, DiscordWebhookTransport, HttpClient,
    InMemoryRecordStore, PollJob, PollingScheduler, PollingSchedulerConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBHOOK_PATH: &str = "/api/webhooks/1/secret";

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 18:01 in Tokyo
fn tokyo_evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 1, 0).unwrap()
}

fn seeded_store(webhook: String) -> InMemoryRecordStore {
    let store = InMemoryRecordStore::new();
    let tomorrow = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();

    store.insert_calendar(Calendar { id: "cal-1".into(), name: "Platform".into() });
    store.upsert_subscription(NotificationSubscription {
        calendar_id: "cal-1".into(),
        destination: webhook,
        trigger_time: "18:00".into(),
        enabled: true,
    });
    store.insert_time_slot(TimeSlot {
        id: "s1".into(),
        calendar_id: "cal-1".into(),
        name: "Standup".into(),
        start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
    });
    for id in ["m1", "m2"] {
        store.insert_member(Member {
            id: id.into(),
            calendar_id: "cal-1".into(),
            name: id.to_uppercase(),
            role: MemberRole::Member,
        });
        store.record_entry(ScheduleEntry {
            member_id: id.into(),
            time_slot_id: "s1".into(),
            date: tomorrow,
            status: AvailabilityStatus::Available,
        });
    }
    store
}

async fn service(server: &MockServer) -> Arc<NotificationCheckService> {
    let store = seeded_store(format!("{}{WEBHOOK_PATH}", server.uri()));
    let http = HttpClient::builder().max_attempts(1).build().unwrap();
    let transport = DiscordWebhookTransport::new(http, ExecutionMode::Production);
    Arc::new(
        NotificationCheckService::new(Arc::new(store), Arc::new(transport), CheckServiceConfig::default())
            .with_clock(Arc::new(FixedClock(tokyo_evening()))),
    )
}

async fn run_for(job: Arc<dyn PollJob>, window: Duration) -> Arc<SchedulerMetrics> {
    let metrics = Arc::new(SchedulerMetrics::new());
    let mut scheduler = PollingScheduler::new(
        job,
        PollingSchedulerConfig::with_cadence(Duration::from_millis(30)),
        Arc::clone(&metrics),
    );
    scheduler.start().await.unwrap();
    tokio::time::sleep(window).await;
    scheduler.stop().await.unwrap();
    // let an in-flight tick finish
    tokio::time::sleep(Duration::from_millis(100)).await;
    metrics
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_ticks_in_the_window_deliver_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let job = Arc::new(CheckAllJob::new(service(&server).await));
    let metrics = run_for(job, Duration::from_millis(200)).await;

    let snapshot = metrics.snapshot();
    assert!(snapshot.ticks_completed >= 3, "snapshot: {snapshot:?}");
    assert_eq!(snapshot.ticks_failed, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn calendar_poll_job_fires_once_per_target_date() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let job = Arc::new(CalendarPollJob::new(service(&server).await, "cal-1"));
    assert_eq!(job.calendar_id(), "cal-1");
    let metrics = run_for(job, Duration::from_millis(200)).await;
    assert_eq!(metrics.snapshot().ticks_failed, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_webhook_does_not_fail_the_tick() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

    let job = Arc::new(CheckAllJob::new(service(&server).await));
    let metrics = run_for(job, Duration::from_millis(100)).await;

    let snapshot = metrics.snapshot();
    assert!(snapshot.ticks_completed >= 1);
    assert_eq!(snapshot.ticks_failed, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn hanging_webhook_is_simulated_in_test_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let remote_timeout = Duration::from_millis(500);
    let delivery = DeliveryConfig { execution_mode: ExecutionMode::Test, ..DeliveryConfig::default() };
    let transport = webhook_transport(&delivery, remote_timeout).unwrap();
    let store = seeded_store(format!("{}{WEBHOOK_PATH}", server.uri()));
    let config = CheckServiceConfig { remote_timeout, ..CheckServiceConfig::default() };
    let service = NotificationCheckService::new(Arc::new(store), Arc::new(transport), config)
        .with_clock(Arc::new(FixedClock(tokyo_evening())));

    let result = service.check_one("cal-1").await.unwrap();

    assert_eq!(result.outcome, CheckOutcome::Delivered { simulated: true });
    assert!(result.delivered);
    assert_eq!(result.slots_found, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn hanging_webhook_fails_in_production_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let remote_timeout = Duration::from_millis(500);
    let transport = webhook_transport(&DeliveryConfig::default(), remote_timeout).unwrap();
    let store = seeded_store(format!("{}{WEBHOOK_PATH}", server.uri()));
    let config = CheckServiceConfig { remote_timeout, ..CheckServiceConfig::default() };
    let service = NotificationCheckService::new(Arc::new(store), Arc::new(transport), config)
        .with_clock(Arc::new(FixedClock(tokyo_evening())));

    let result = service.check_one("cal-1").await.unwrap();

    assert!(matches!(
        &result.outcome,
        CheckOutcome::Failed { kind, .. } if kind == "upstream_unavailable"
    ));
    assert!(!result.delivered);
}
