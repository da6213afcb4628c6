//! Shared state for CLI commands

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use slotwatch_core::NotificationCheckService;
use slotwatch_domain::Config;
use slotwatch_infra::{build_check_service, config};

pub struct AppContext {
    pub config: Config,
    pub service: Arc<NotificationCheckService>,
}

impl AppContext {
    /// Loads configuration (explicit file, else environment, else probed
    /// files) and wires the check service
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config = match path {
            Some(path) => config::load_from_file(Some(path))?,
            None => config::load()?,
        };
        let service = build_check_service(&config).context("failed to configure check service")?;
        Ok(Self { config, service: Arc::new(service) })
    }
}
