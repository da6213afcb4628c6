use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwatch_core::{Clock, DeliveryReceipt, NotificationPayload, NotificationTransport};
use slotwatch_domain::{Result as DomainResult, SlotwatchError};

/// Records every payload; optionally answers with a fixed error.
#[derive(Default, Clone)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<(String, NotificationPayload)>>>,
    failure: Option<SlotwatchError>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(status: u16, reason: &str) -> Self {
        Self {
            failure: Some(SlotwatchError::DestinationRejected { status, reason: reason.into() }),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, NotificationPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn deliver(
        &self,
        destination: &str,
        payload: &NotificationPayload,
    ) -> DomainResult<DeliveryReceipt> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.sent.lock().unwrap().push((destination.to_string(), payload.clone()));
        Ok(DeliveryReceipt::delivered(204))
    }
}

/// Clock pinned to a fixed instant
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
