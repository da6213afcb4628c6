//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the store credentials are absent, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SLOTWATCH_STORE_URL` (or `SUPABASE_URL`): record store base URL
//! - `SLOTWATCH_STORE_KEY` (or `SUPABASE_ANON_KEY`): record store API key
//! - `SLOTWATCH_STORAGE_TIMEZONE`: zone trigger times are stored in
//! - `SLOTWATCH_MATCH_POLICY`: `tolerance` or `exact`
//! - `SLOTWATCH_TOLERANCE_MINUTES`: half-width of the tolerance window
//! - `SLOTWATCH_CADENCE_SECONDS`: scheduler tick interval
//! - `SLOTWATCH_REMOTE_TIMEOUT_SECONDS`: timeout for every remote call
//! - `SLOTWATCH_LOOKAHEAD_DAYS`: days between the check and the slot date
//! - `SLOTWATCH_MAX_CONCURRENCY`: subscriptions checked in parallel
//! - `SLOTWATCH_SUPPRESS_DUPLICATES`: remember deliveries per date (true/false)
//! - `SLOTWATCH_EXECUTION_MODE`: `production` or `test`
//! - `SLOTWATCH_USER_AGENT`: user agent for outbound requests
//!
//! Only the store URL and key are required; everything else has a default.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./slotwatch.{toml,json}` (current working directory)
//! 2. `./config.{toml,json}` (current working directory)
//! 3. The same names next to the executable

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use slotwatch_domain::{Config, DeliveryConfig, NotificationConfig, Result, SlotwatchError, StoreConfig};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["slotwatch.toml", "slotwatch.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns the environment error when no config file exists either, and
/// `SlotwatchError::Config` when a file exists but cannot be parsed.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(env_err) => {
            tracing::debug!(error = %env_err, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => Err(env_err),
            }
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `SlotwatchError::ConfigurationMissing` when the store URL or key
/// is absent and `SlotwatchError::Config` when a tunable cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var_any(&["SLOTWATCH_STORE_URL", "SUPABASE_URL"])?;
    let api_key = env_var_any(&["SLOTWATCH_STORE_KEY", "SUPABASE_ANON_KEY"])?;

    let defaults = NotificationConfig::default();
    let notifications = NotificationConfig {
        storage_timezone: std::env::var("SLOTWATCH_STORAGE_TIMEZONE")
            .unwrap_or(defaults.storage_timezone),
        match_policy: env_parse("SLOTWATCH_MATCH_POLICY", defaults.match_policy)?,
        tolerance_minutes: env_parse("SLOTWATCH_TOLERANCE_MINUTES", defaults.tolerance_minutes)?,
        cadence_seconds: env_parse("SLOTWATCH_CADENCE_SECONDS", defaults.cadence_seconds)?,
        remote_timeout_seconds: env_parse(
            "SLOTWATCH_REMOTE_TIMEOUT_SECONDS",
            defaults.remote_timeout_seconds,
        )?,
        lookahead_days: env_parse("SLOTWATCH_LOOKAHEAD_DAYS", defaults.lookahead_days)?,
        max_concurrency: env_parse("SLOTWATCH_MAX_CONCURRENCY", defaults.max_concurrency)?,
        suppress_duplicates: env_bool("SLOTWATCH_SUPPRESS_DUPLICATES", defaults.suppress_duplicates),
    };

    let delivery_defaults = DeliveryConfig::default();
    let delivery = DeliveryConfig {
        execution_mode: env_parse("SLOTWATCH_EXECUTION_MODE", delivery_defaults.execution_mode)?,
        user_agent: std::env::var("SLOTWATCH_USER_AGENT").unwrap_or(delivery_defaults.user_agent),
    };

    Ok(Config { store: StoreConfig { base_url, api_key }, notifications, delivery })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected by
/// file extension.
///
/// # Errors
/// Returns `SlotwatchError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SlotwatchError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SlotwatchError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SlotwatchError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SlotwatchError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SlotwatchError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SlotwatchError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the working directory, then next to the
/// executable
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// First non-empty value among `keys`
fn env_var_any(keys: &[&str]) -> Result<String> {
    keys.iter()
        .find_map(|key| std::env::var(key).ok().filter(|value| !value.trim().is_empty()))
        .ok_or_else(|| {
            SlotwatchError::ConfigurationMissing(format!(
                "Missing required environment variable: {}",
                keys.join(" or ")
            ))
        })
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| SlotwatchError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
