use anyhow::Result;
use chrono::NaiveDate;
use slotwatch_core::CheckResult;

use super::print_json;
use crate::context::AppContext;

pub async fn run_all(ctx: &AppContext, date: Option<NaiveDate>) -> Result<()> {
    let target_date = date.unwrap_or_else(|| ctx.service.target_date());
    let results = ctx.service.check_all(target_date).await?;
    print_json(&summary(&results))
}

pub async fn run_one(ctx: &AppContext, calendar_id: &str) -> Result<()> {
    let result = ctx.service.check_one(calendar_id).await?;
    print_json(&result)
}

fn summary(results: &[CheckResult]) -> serde_json::Value {
    serde_json::json!({
        "checked": results.len(),
        "delivered": results.iter().filter(|result| result.delivered).count(),
        "failed": results.iter().filter(|result| result.outcome.is_failure()).count(),
        "results": results,
    })
}
