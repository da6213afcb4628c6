use anyhow::Result;
use chrono::Utc;
use slotwatch_core::time_codec::{debug_conversion, format_timezone_info};

use super::print_json;

pub fn run(time: &str, from: &str, to: &str) -> Result<()> {
    let now = Utc::now();
    let report = debug_conversion(time, from, to, now);
    print_json(&serde_json::json!({
        "conversion": report,
        "from_zone": format_timezone_info(from, now),
        "to_zone": format_timezone_info(to, now),
    }))
}
