//! Wire record carried by the event channel.

use chrono::{DateTime, Utc};
use common::CoreError;
use serde::Serialize;
use uuid::Uuid;

/// A published message: topic, partition key, and serialized payload.
///
/// The payload travels as JSON so the channel stays agnostic of the
/// event types each service defines.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Unique identifier of this publication.
    pub event_id: Uuid,

    /// Topic the envelope was published on.
    pub topic: &'static str,

    /// Partition key. Lifecycle and payment-status topics both use the
    /// order ID, which yields per-order ordering.
    pub key: String,

    /// Serialized event payload.
    pub payload: serde_json::Value,

    /// Publication timestamp.
    pub published_at: DateTime<Utc>,
}

impl Envelope {
    /// Builds an envelope from a serializable payload.
    pub fn new(
        topic: &'static str,
        key: impl Into<String>,
        payload: &impl Serialize,
    ) -> Result<Self, CoreError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| CoreError::Internal(format!("failed to serialize event payload: {e}")))?;

        Ok(Self {
            event_id: Uuid::new_v4(),
            topic,
            key: key.into(),
            payload,
            published_at: Utc::now(),
        })
    }

    /// Deserializes the payload into the consumer's event type.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, CoreError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| CoreError::Internal(format!("failed to decode event payload: {e}")))
    }
}
