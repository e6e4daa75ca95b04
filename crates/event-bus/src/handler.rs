//! Publish and consume seams.

use async_trait::async_trait;
use common::CoreError;

use crate::envelope::Envelope;

/// Publishing side of the transport.
///
/// Services hold this trait object so the concrete transport (in-memory
/// here, a broker in production) stays swappable.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Publishes an envelope. Returns once the message is durably
    /// enqueued, not once it is consumed.
    async fn publish(&self, envelope: Envelope) -> Result<(), CoreError>;
}

/// Consuming side of the transport.
///
/// Handlers run to completion per envelope. A returned error is
/// classified by [`CoreError::is_event_retryable`]: not-found failures
/// are discarded (redelivery cannot change the outcome), everything
/// else is retried under the channel's bounded retry policy and dropped
/// after exhaustion.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Consumer name, used in logs.
    fn name(&self) -> &'static str;

    /// Handles one envelope.
    async fn handle(&self, envelope: &Envelope) -> Result<(), CoreError>;
}
