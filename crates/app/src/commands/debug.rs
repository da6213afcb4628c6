use anyhow::Result;
use slotwatch_core::time_codec::{current_time, format_timezone_info};
use slotwatch_infra::delivery::redact_destination;

use super::print_json;
use crate::context::AppContext;

pub async fn explain(ctx: &AppContext, calendar_id: &str) -> Result<()> {
    let (subscription, decision) = ctx.service.explain(calendar_id).await?;
    let zone = ctx.service.config().storage_zone.name();

    print_json(&serde_json::json!({
        "calendar_id": subscription.calendar_id,
        "enabled": subscription.enabled,
        "trigger_time": subscription.trigger_time,
        "destination": redact_destination(&subscription.destination),
        "storage_zone": format_timezone_info(zone, chrono::Utc::now()),
        "storage_time": current_time(zone),
        "target_date": ctx.service.target_date(),
        "would_fire": subscription.enabled && decision.due,
        "decision": decision,
    }))
}
