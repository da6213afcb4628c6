//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for slotwatch
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SlotwatchError {
    /// Input that does not match the expected shape (time strings, ids, URLs)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Record store or delivery endpoint unreachable or timed out
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Delivery endpoint answered but refused the message
    #[error("Destination rejected (status {status}): {reason}")]
    DestinationRejected { status: u16, reason: String },

    /// Required configuration value absent at startup
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SlotwatchError {
    /// Short stable label used in logs and check results
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::DestinationRejected { .. } => "destination_rejected",
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for slotwatch operations
pub type Result<T> = std::result::Result<T, SlotwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(SlotwatchError::MalformedInput("x".into()).kind(), "malformed_input");
        assert_eq!(
            SlotwatchError::DestinationRejected { status: 404, reason: "gone".into() }.kind(),
            "destination_rejected"
        );
        assert_eq!(SlotwatchError::UpstreamUnavailable("timeout".into()).kind(), "upstream_unavailable");
    }

    #[test]
    fn display_includes_status_for_rejections() {
        let err = SlotwatchError::DestinationRejected { status: 401, reason: "Unauthorized".into() };
        assert_eq!(err.to_string(), "Destination rejected (status 401): Unauthorized");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(SlotwatchError::NotFound("calendar c1".into())).unwrap();
        assert_eq!(json["type"], "NotFound");
        assert_eq!(json["message"], "calendar c1");
    }
}
