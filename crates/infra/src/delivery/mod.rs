//! Outbound notification transports

pub mod discord;

pub use discord::{redact_destination, render_embed, validate_webhook_url, DiscordWebhookTransport};
