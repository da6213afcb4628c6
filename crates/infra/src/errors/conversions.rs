//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use slotwatch_domain::SlotwatchError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SlotwatchError);

impl From<InfraError> for SlotwatchError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SlotwatchError> for InfraError {
    fn from(value: SlotwatchError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSlotwatchError {
    fn into_slotwatch(self) -> SlotwatchError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SlotwatchError */
/* -------------------------------------------------------------------------- */

impl IntoSlotwatchError for HttpError {
    fn into_slotwatch(self) -> SlotwatchError {
        if self.is_timeout() {
            return SlotwatchError::UpstreamUnavailable("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SlotwatchError::UpstreamUnavailable("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let reason = status.canonical_reason().unwrap_or("unknown status").to_string();

            return match code {
                429 | 500..=599 => SlotwatchError::UpstreamUnavailable(format!("HTTP {code} {reason}")),
                400..=499 => SlotwatchError::DestinationRejected { status: code, reason },
                _ => SlotwatchError::Internal(format!("unexpected HTTP {code} {reason}")),
            };
        }

        if self.is_builder() {
            return SlotwatchError::MalformedInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return SlotwatchError::Internal(format!("failed to decode HTTP response: {self}"));
        }

        SlotwatchError::UpstreamUnavailable(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_slotwatch())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
