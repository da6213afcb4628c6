//! PostgREST (Supabase) record store
//!
//! Reads the `discord_notifications`, `calendars`, `members`, `time_slots`
//! and `schedules` tables over the REST interface. The adapter is read-only.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use slotwatch_core::RecordStore;
use slotwatch_domain::{
    AvailabilityStatus, Calendar, Member, MemberRole, NotificationSubscription, Result,
    ScheduleEntry, SlotwatchError, StoreConfig, TimeSlot,
};
use tracing::{debug, instrument};
use url::Url;

use crate::http::HttpClient;

const SUBSCRIPTIONS: &str = "discord_notifications";
const CALENDARS: &str = "calendars";
const MEMBERS: &str = "members";
const TIME_SLOTS: &str = "time_slots";
const SCHEDULES: &str = "schedules";

/// Identifiers arrive as UUID strings or integer keys depending on the schema
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SubscriptionRow {
    calendar_id: RawId,
    webhook_url: String,
    notification_time: String,
    #[serde(default)]
    enabled: bool,
}

#[derive(Deserialize)]
struct CalendarRow {
    id: RawId,
    name: String,
}

#[derive(Deserialize)]
struct MemberRow {
    id: RawId,
    calendar_id: RawId,
    name: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Deserialize)]
struct TimeSlotRow {
    id: RawId,
    calendar_id: RawId,
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

#[derive(Deserialize)]
struct ScheduleRow {
    member_id: RawId,
    time_slot_id: RawId,
    date: NaiveDate,
    #[serde(default)]
    status: Option<String>,
}

/// Read-only PostgREST client
#[derive(Clone)]
pub struct PostgrestRecordStore {
    http: HttpClient,
    rest_root: Url,
}

impl PostgrestRecordStore {
    /// Builds a store from configuration
    ///
    /// # Errors
    /// `Config` when the base URL or key cannot be used.
    pub fn new(config: &StoreConfig, http: crate::http::HttpClientBuilder) -> Result<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let rest_root = Url::parse(&base)
            .and_then(|url| url.join("rest/v1/"))
            .map_err(|err| SlotwatchError::Config(format!("invalid store base_url: {err}")))?;

        let http = http.default_headers(auth_headers(&config.api_key)?).build()?;
        Ok(Self { http, rest_root })
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, filters: &[(&str, String)]) -> Result<Vec<T>> {
        let url = self
            .rest_root
            .join(table)
            .map_err(|err| SlotwatchError::Internal(format!("bad table path {table}: {err}")))?;

        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());

        debug!(table, filters = filters.len(), "querying record store");
        self.http
            .get_json::<Vec<T>>(self.http.request(Method::GET, url).query(&query))
            .await
            .map_err(|err| store_error(table, err))
    }
}

fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let invalid = |_| SlotwatchError::Config("store api_key is not a valid header value".into());
    let mut key = HeaderValue::from_str(api_key).map_err(invalid)?;
    key.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(invalid)?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

/// Statuses from the store mean something different than from a webhook
fn store_error(table: &str, err: SlotwatchError) -> SlotwatchError {
    match err {
        SlotwatchError::DestinationRejected { status: 401 | 403, reason } => {
            SlotwatchError::Config(format!("record store rejected credentials: {reason}"))
        }
        SlotwatchError::DestinationRejected { status: 404, .. } => {
            SlotwatchError::NotFound(format!("table {table}"))
        }
        SlotwatchError::DestinationRejected { status, reason } => {
            SlotwatchError::MalformedInput(format!("query on {table} refused ({status}): {reason}"))
        }
        other => other,
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl RecordStore for PostgrestRecordStore {
    #[instrument(skip(self))]
    async fn list_subscriptions(&self, enabled: bool) -> Result<Vec<NotificationSubscription>> {
        let rows: Vec<SubscriptionRow> = self.select(SUBSCRIPTIONS, &[("enabled", eq(enabled))]).await?;
        Ok(rows
            .into_iter()
            .map(|row| NotificationSubscription {
                calendar_id: row.calendar_id.into(),
                destination: row.webhook_url,
                trigger_time: row.notification_time,
                enabled: row.enabled,
            })
            .collect())
    }

    async fn find_calendar(&self, calendar_id: &str) -> Result<Option<Calendar>> {
        let rows: Vec<CalendarRow> = self
            .select(CALENDARS, &[("id", eq(calendar_id)), ("limit", "1".to_string())])
            .await?;
        Ok(rows.into_iter().next().map(|row| Calendar { id: row.id.into(), name: row.name }))
    }

    async fn list_members(&self, calendar_id: &str) -> Result<Vec<Member>> {
        let rows: Vec<MemberRow> = self.select(MEMBERS, &[("calendar_id", eq(calendar_id))]).await?;
        Ok(rows
            .into_iter()
            .map(|row| Member {
                id: row.id.into(),
                calendar_id: row.calendar_id.into(),
                name: row.name,
                role: row.role.and_then(|role| role.parse().ok()).unwrap_or(MemberRole::Member),
            })
            .collect())
    }

    async fn list_time_slots(&self, calendar_id: &str) -> Result<Vec<TimeSlot>> {
        let rows: Vec<TimeSlotRow> = self
            .select(
                TIME_SLOTS,
                &[("calendar_id", eq(calendar_id)), ("order", "start_time.asc".to_string())],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| TimeSlot {
                id: row.id.into(),
                calendar_id: row.calendar_id.into(),
                name: row.name,
                start: row.start_time,
                end: row.end_time,
            })
            .collect())
    }

    async fn list_entries(&self, calendar_id: &str, date: NaiveDate) -> Result<Vec<ScheduleEntry>> {
        let rows: Vec<ScheduleRow> = self
            .select(
                SCHEDULES,
                &[("calendar_id", eq(calendar_id)), ("date", eq(date.format("%Y-%m-%d")))],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| ScheduleEntry {
                member_id: row.member_id.into(),
                time_slot_id: row.time_slot_id.into(),
                date: row.date,
                status: AvailabilityStatus::from_persisted(row.status.as_deref()),
            })
            .collect())
    }
}
