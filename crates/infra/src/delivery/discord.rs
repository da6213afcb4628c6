//! Discord webhook transport
//!
//! Renders a [`NotificationPayload`] as a single embed and posts it to the
//! subscription's webhook. Webhook URLs embed a secret token, so logs only
//! ever see a salted hash of the destination.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use slotwatch_core::notification::message::date_heading;
use slotwatch_core::{DeliveryReceipt, NotificationPayload, NotificationTransport, PayloadKind};
use slotwatch_domain::constants::{
    EMBED_COLOR_AVAILABLE, EMBED_COLOR_TEST, EMBED_FOOTER, WEBHOOK_PATH_MARKER,
};
use slotwatch_domain::{ExecutionMode, Result, SlotwatchError};
use tracing::{info, instrument, warn};
use url::Url;

use crate::http::HttpClient;

/// Discord rejects embed field values longer than this
const FIELD_VALUE_LIMIT: usize = 1024;

pub struct DiscordWebhookTransport {
    http: HttpClient,
    mode: ExecutionMode,
}

impl DiscordWebhookTransport {
    pub fn new(http: HttpClient, mode: ExecutionMode) -> Self {
        Self { http, mode }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

#[async_trait]
impl NotificationTransport for DiscordWebhookTransport {
    #[instrument(skip_all, fields(destination = %redact_destination(destination), kind = ?payload.kind))]
    async fn deliver(&self, destination: &str, payload: &NotificationPayload) -> Result<DeliveryReceipt> {
        let url = validate_webhook_url(destination)?;
        let body = render_embed(payload);

        let response = match self.http.send(self.http.request(Method::POST, url).json(&body)).await {
            Ok(response) => response,
            Err(SlotwatchError::UpstreamUnavailable(reason)) if self.mode.allows_simulated_delivery() => {
                warn!(%reason, slots = payload.slot_count(), "webhook unreachable, simulating delivery in test mode");
                return Ok(DeliveryReceipt::simulated());
            }
            Err(err) => return Err(err),
        };

        let status = response.status();
        if status.is_success() {
            info!(status = status.as_u16(), slots = payload.slot_count(), "webhook accepted notification");
            return Ok(DeliveryReceipt::delivered(status.as_u16()));
        }

        let text = response.text().await.unwrap_or_default();
        let reason = if text.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_string()
        } else {
            text
        };

        // 429 outlasting the retries is congestion, not a refusal
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            Err(SlotwatchError::DestinationRejected { status: status.as_u16(), reason })
        } else {
            Err(SlotwatchError::UpstreamUnavailable(format!("webhook returned {status}: {reason}")))
        }
    }
}

/// Parses a destination and checks it looks like a webhook endpoint
///
/// # Errors
/// `MalformedInput` for unparsable URLs, non-HTTP schemes, or paths that do
/// not contain `/api/webhooks/`.
pub fn validate_webhook_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|err| SlotwatchError::MalformedInput(format!("invalid webhook URL: {err}")))?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(SlotwatchError::MalformedInput(format!(
            "webhook URL must use http(s), got {}",
            url.scheme()
        )));
    }
    if !url.path().contains(WEBHOOK_PATH_MARKER) {
        return Err(SlotwatchError::MalformedInput("invalid Discord webhook URL".into()));
    }
    Ok(url)
}

/// Builds the webhook request body
pub fn render_embed(payload: &NotificationPayload) -> Value {
    let embed = match payload.kind {
        PayloadKind::Availability => {
            let mut fields =
                vec![json!({ "name": "📊 Summary", "value": payload.summary, "inline": false })];
            fields.extend(payload.groups().into_iter().map(|(date, slots)| {
                let lines: Vec<String> = slots.iter().map(|slot| slot.line()).collect();
                json!({
                    "name": format!("📅 {}", date_heading(date)),
                    "value": truncate_field(&lines.join("\n")),
                    "inline": false,
                })
            }));
            json!({
                "title": payload.title,
                "description": format!(
                    "Great news! Your team has **100% availability** for these time slots in **{}**.",
                    payload.calendar_name
                ),
                "color": EMBED_COLOR_AVAILABLE,
                "fields": fields,
                "footer": { "text": format!("{EMBED_FOOTER} • Perfect attendance opportunity!") },
                "timestamp": payload.generated_at.to_rfc3339(),
            })
        }
        PayloadKind::Test => json!({
            "title": payload.title,
            "description": format!("This is a test notification from **{}**.", payload.calendar_name),
            "color": EMBED_COLOR_TEST,
            "fields": [
                { "name": "📅 Calendar", "value": payload.calendar_name, "inline": true },
                {
                    "name": "⏰ Time",
                    "value": payload.generated_at.format("%b %-d, %Y, %H:%M UTC").to_string(),
                    "inline": true,
                },
            ],
            "footer": { "text": EMBED_FOOTER },
            "timestamp": payload.generated_at.to_rfc3339(),
        }),
    };
    json!({ "embeds": [embed] })
}

fn truncate_field(value: &str) -> String {
    if value.chars().count() <= FIELD_VALUE_LIMIT {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(FIELD_VALUE_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}

/// Stable, non-reversible label for a destination in logs
pub fn redact_destination(destination: &str) -> String {
    const DESTINATION_HASH_SALT: &[u8] = b"slotwatch-webhook-destination-salt";
    let mut hasher = Sha256::new();
    hasher.update(DESTINATION_HASH_SALT);
    hasher.update(destination.as_bytes());
    let digest = hasher.finalize();
    format!("webhook_hash={}", hex::encode(&digest[..8]))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use slotwatch_core::QualifiedSlot;

    use super::*;

    fn payload() -> NotificationPayload {
        let slot = |day: u32, name: &str, hour: u32| QualifiedSlot {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            name: name.into(),
            start: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(hour, 30, 0).unwrap(),
        };
        NotificationPayload::availability(
            "Platform Team",
            vec![slot(16, "Standup", 9), slot(16, "Retro", 16), slot(17, "Planning", 10)],
            1,
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn validates_webhook_shape() {
        assert!(validate_webhook_url("https://discord.com/api/webhooks/123/token").is_ok());
        assert!(validate_webhook_url("http://127.0.0.1:8080/api/webhooks/1/t").is_ok());
        for bad in ["", "discord.com/api/webhooks/1", "https://discord.com/channels/1", "ftp://x/api/webhooks/1/t"] {
            assert!(
                matches!(validate_webhook_url(bad), Err(SlotwatchError::MalformedInput(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn availability_embed_groups_slots_by_date() {
        let body = render_embed(&payload());
        let embed = &body["embeds"][0];
        assert_eq!(embed["title"], "🎉 Tomorrow's 100% Team Availability!");
        assert_eq!(embed["color"], 0x10b981);
        assert!(embed["description"].as_str().unwrap().contains("**Platform Team**"));

        let fields = embed["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0]["value"], "3 time slots available tomorrow");
        assert_eq!(fields[1]["name"], "📅 Tuesday, January 16, 2024");
        assert_eq!(fields[1]["value"], "• Standup (09:00 - 09:30)\n• Retro (16:00 - 16:30)");
        assert_eq!(fields[2]["name"], "📅 Wednesday, January 17, 2024");
        assert_eq!(embed["timestamp"], "2024-01-15T09:00:00+00:00");
    }

    #[test]
    fn test_embed_uses_blue_and_calendar_fields() {
        let payload =
            NotificationPayload::test("Platform Team", Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 0).unwrap());
        let embed = &render_embed(&payload)["embeds"][0];
        assert_eq!(embed["title"], "🧪 Test Notification");
        assert_eq!(embed["color"], 0x3b82f6);
        assert_eq!(embed["fields"][0]["value"], "Platform Team");
        assert_eq!(embed["fields"][1]["value"], "Jan 15, 2024, 09:05 UTC");
    }

    #[test]
    fn long_field_values_are_truncated() {
        let long = "x".repeat(FIELD_VALUE_LIMIT + 50);
        let truncated = truncate_field(&long);
        assert_eq!(truncated.chars().count(), FIELD_VALUE_LIMIT);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn redaction_is_deterministic_and_hides_token() {
        let url = "https://discord.com/api/webhooks/123/secret-token";
        let first = redact_destination(url);
        assert_eq!(first, redact_destination(url));
        assert!(first.starts_with("webhook_hash="));
        assert_eq!(first.len(), "webhook_hash=".len() + 16);
        assert!(!first.contains("secret"));
        assert_ne!(first, redact_destination("https://discord.com/api/webhooks/123/other"));
    }
}
