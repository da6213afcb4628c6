//! Slotwatch - team availability notifications
//!
//! `run` starts the polling scheduler; the other subcommands perform a single
//! operation and print the result as JSON.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod commands;
mod context;

use anyhow::Result;
use clap::{Parser, Subcommand};
use context::AppContext;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slotwatch")]
#[command(about = "Notify teams when every member is available for a time slot")]
struct Cli {
    /// Config file (TOML or JSON) to use instead of environment variables
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the polling scheduler until interrupted
    Run {
        /// Only watch this calendar, forcing a check when its trigger is due
        #[arg(long)]
        calendar: Option<String>,
    },
    /// Run one check pass over every enabled subscription
    Check {
        /// Check this date (YYYY-MM-DD) instead of the lookahead date
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Check one calendar now, ignoring its trigger time
    CheckCalendar { calendar_id: String },
    /// Send a test notification to a calendar's destination
    TestNotification { calendar_id: String },
    /// Convert an HH:MM time between timezones
    Timezone {
        /// Wall-clock time, e.g. 18:00
        #[arg(long)]
        time: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Show why a calendar's subscription would or would not fire now
    DebugSubscription { calendar_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before the filter reads RUST_LOG
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!(error = %err, "no .env file loaded"),
    }

    let cli = Cli::parse();

    let config = cli.config;

    match cli.command {
        Commands::Run { calendar } => commands::run::run(AppContext::load(config)?, calendar).await,
        Commands::Check { date } => commands::check::run_all(&AppContext::load(config)?, date).await,
        Commands::CheckCalendar { calendar_id } => {
            commands::check::run_one(&AppContext::load(config)?, &calendar_id).await
        }
        Commands::TestNotification { calendar_id } => {
            commands::notify::send_test(&AppContext::load(config)?, &calendar_id).await
        }
        Commands::Timezone { time, from, to } => commands::timezone::run(&time, &from, &to),
        Commands::DebugSubscription { calendar_id } => {
            commands::debug::explain(&AppContext::load(config)?, &calendar_id).await
        }
    }
}

/// `RUST_LOG` filter (default `info`), `SLOTWATCH_LOG_FORMAT=json` for JSON lines
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("SLOTWATCH_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_timezone_conversion() {
        let cli = Cli::try_parse_from([
            "slotwatch", "timezone", "--time", "18:00", "--from", "Asia/Tokyo", "--to", "UTC",
        ])
        .unwrap();
        match cli.command {
            Commands::Timezone { time, from, to } => {
                assert_eq!((time.as_str(), from.as_str(), to.as_str()), ("18:00", "Asia/Tokyo", "UTC"));
            }
            _ => panic!("expected timezone command"),
        }
    }

    #[test]
    fn parses_check_with_date_and_global_config() {
        let cli = Cli::try_parse_from(["slotwatch", "check", "--date", "2024-01-16", "-c", "slotwatch.toml"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("slotwatch.toml")));
        match cli.command {
            Commands::Check { date } => assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2024, 1, 16)),
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn rejects_malformed_check_date() {
        assert!(Cli::try_parse_from(["slotwatch", "check", "--date", "tomorrow"]).is_err());
    }
}
