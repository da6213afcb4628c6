use anyhow::Result;

use super::print_json;
use crate::context::AppContext;

pub async fn send_test(ctx: &AppContext, calendar_id: &str) -> Result<()> {
    let receipt = ctx.service.send_test(calendar_id).await?;
    let message = if receipt.simulated {
        "Test notification simulated (webhook unreachable in test mode)"
    } else {
        "Test notification sent successfully"
    };
    print_json(&serde_json::json!({
        "success": true,
        "message": message,
        "calendar_id": calendar_id,
        "receipt": receipt,
    }))
}
