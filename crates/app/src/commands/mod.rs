pub mod check;
pub mod debug;
pub mod notify;
pub mod run;
pub mod timezone;

use serde::Serialize;

/// Pretty JSON on stdout; logs go to stderr
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
