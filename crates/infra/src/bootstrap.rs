//! Wires the production adapters into a check service

use std::sync::Arc;
use std::time::Duration;

use slotwatch_core::{CheckServiceConfig, NotificationCheckService};
use slotwatch_domain::{Config, DeliveryConfig, Result};
use tracing::info;

use crate::delivery::DiscordWebhookTransport;
use crate::http::{HttpClient, HttpClientBuilder};
use crate::store::PostgrestRecordStore;

/// Builds a check service backed by the PostgREST store and Discord webhooks
///
/// # Errors
/// Configuration problems (invalid timezone, missing credentials) and HTTP
/// client construction failures.
pub fn build_check_service(config: &Config) -> Result<NotificationCheckService> {
    config.validate()?;
    let timeout = config.notifications.remote_timeout();

    let store = PostgrestRecordStore::new(&config.store, http_builder(&config.delivery, timeout))?;
    let transport = webhook_transport(&config.delivery, timeout)?;

    let service_config = CheckServiceConfig::from_config(&config.notifications)?;
    info!(
        policy = %service_config.policy,
        zone = %service_config.storage_zone,
        mode = ?config.delivery.execution_mode,
        "check service configured"
    );
    Ok(NotificationCheckService::new(Arc::new(store), Arc::new(transport), service_config))
}

/// Webhook transport whose retries finish inside the service's per-call timeout
///
/// The transport has to give up first: a test-mode simulated delivery only
/// happens when the transport itself reports the webhook unreachable.
pub fn webhook_transport(
    delivery: &DeliveryConfig,
    remote_timeout: Duration,
) -> Result<DiscordWebhookTransport> {
    let http = http_builder(delivery, remote_timeout).build()?;
    Ok(DiscordWebhookTransport::new(http, delivery.execution_mode))
}

fn http_builder(delivery: &DeliveryConfig, remote_timeout: Duration) -> HttpClientBuilder {
    HttpClient::builder()
        .timeout(remote_timeout)
        .budget(remote_timeout.saturating_sub(remote_timeout / 4))
        .user_agent(delivery.user_agent.clone())
}

#[cfg(test)]
mod tests {
    use slotwatch_domain::{SlotwatchError, StoreConfig};

    use super::*;

    #[test]
    fn rejects_missing_credentials() {
        let err = build_check_service(&Config::default()).err().unwrap();
        assert!(matches!(err, SlotwatchError::ConfigurationMissing(_)));
    }

    #[test]
    fn builds_with_valid_config() {
        let config = Config {
            store: StoreConfig {
                base_url: "https://example.supabase.co".into(),
                api_key: "anon-key".into(),
            },
            ..Config::default()
        };
        let service = build_check_service(&config).unwrap();
        assert_eq!(service.config().max_concurrency, 4);
    }
}
