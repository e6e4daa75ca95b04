//! In-memory event bus implementation.
//!
//! Provides the same delivery semantics a partitioned broker would:
//! envelopes are hashed by `(topic, key)` onto a fixed set of partition
//! workers, each of which consumes its queue sequentially. Within a
//! partition, every subscriber of the topic sees each message in order;
//! across partitions, dispatch runs in parallel.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::CoreError;
use tokio::sync::{Notify, RwLock, mpsc};

use crate::envelope::Envelope;
use crate::handler::{EventChannel, EventHandler};
use crate::retry::RetryPolicy;

const DEFAULT_PARTITIONS: usize = 4;

struct Shared {
    subscribers: RwLock<HashMap<&'static str, Vec<Arc<dyn EventHandler>>>>,
    retry: RetryPolicy,
    /// Messages enqueued but not yet fully dispatched, cascades included.
    in_flight: AtomicUsize,
    idle: Notify,
}

/// In-memory, at-least-once event bus.
///
/// Cloning is cheap; clones share the same partitions and subscribers.
#[derive(Clone)]
pub struct InMemoryEventBus {
    partitions: Vec<mpsc::UnboundedSender<Envelope>>,
    shared: Arc<Shared>,
}

impl InMemoryEventBus {
    /// Creates a bus with the given partition count and retry policy,
    /// spawning one worker task per partition.
    pub fn new(partitions: usize, retry: RetryPolicy) -> Self {
        let shared = Arc::new(Shared {
            subscribers: RwLock::new(HashMap::new()),
            retry,
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        });

        let mut senders = Vec::with_capacity(partitions.max(1));
        for partition in 0..partitions.max(1) {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.push(tx);
            tokio::spawn(run_partition(partition, rx, shared.clone()));
        }

        Self {
            partitions: senders,
            shared,
        }
    }

    /// Creates a bus with the default partition count and retry policy.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_PARTITIONS, RetryPolicy::default())
    }

    /// Registers a handler for a topic.
    pub async fn subscribe(&self, topic: &'static str, handler: Arc<dyn EventHandler>) {
        tracing::info!(topic, handler = handler.name(), "subscribed event handler");
        self.shared
            .subscribers
            .write()
            .await
            .entry(topic)
            .or_default()
            .push(handler);
    }

    /// Waits until every published message, including those published
    /// from inside handlers, has been fully dispatched.
    pub async fn flush(&self) {
        loop {
            if self.shared.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            // Register as a waiter before re-checking: an unpolled
            // Notified future misses notify_waiters calls, so a worker
            // draining to zero between the check and the await would
            // otherwise leave this task parked forever.
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.shared.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn partition_for(&self, topic: &str, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        topic.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.partitions.len()
    }
}

#[async_trait]
impl EventChannel for InMemoryEventBus {
    async fn publish(&self, envelope: Envelope) -> Result<(), CoreError> {
        let partition = self.partition_for(envelope.topic, &envelope.key);

        tracing::debug!(
            topic = envelope.topic,
            key = %envelope.key,
            partition,
            "publishing event"
        );
        metrics::counter!("bus_events_published").increment(1);

        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
        self.partitions[partition].send(envelope).map_err(|_| {
            self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
            CoreError::Internal("event bus partition worker is gone".to_string())
        })?;

        Ok(())
    }
}

async fn run_partition(
    partition: usize,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    shared: Arc<Shared>,
) {
    while let Some(envelope) = rx.recv().await {
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let subscribers = shared.subscribers.read().await;
            subscribers
                .get(envelope.topic)
                .map(|h| h.to_vec())
                .unwrap_or_default()
        };

        for handler in handlers {
            deliver(partition, &envelope, handler.as_ref(), &shared.retry).await;
        }

        if shared.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            shared.idle.notify_waiters();
        }
    }
}

/// Delivers one envelope to one handler under the bounded retry policy.
async fn deliver(partition: usize, envelope: &Envelope, handler: &dyn EventHandler, retry: &RetryPolicy) {
    for attempt in 1..=retry.max_attempts {
        match handler.handle(envelope).await {
            Ok(()) => return,
            Err(e) if !e.is_event_retryable() => {
                // Redelivery cannot change a not-found outcome.
                tracing::warn!(
                    topic = envelope.topic,
                    key = %envelope.key,
                    partition,
                    handler = handler.name(),
                    error = %e,
                    "non-retryable handler failure, discarding message"
                );
                metrics::counter!("bus_events_discarded").increment(1);
                return;
            }
            Err(e) if attempt < retry.max_attempts => {
                tracing::warn!(
                    topic = envelope.topic,
                    key = %envelope.key,
                    handler = handler.name(),
                    attempt,
                    error = %e,
                    "handler failed, retrying after backoff"
                );
                metrics::counter!("bus_handler_retries").increment(1);
                tokio::time::sleep(retry.backoff).await;
            }
            Err(e) => {
                // No dead-letter path: after exhaustion the message is
                // logged and dropped.
                tracing::error!(
                    topic = envelope.topic,
                    key = %envelope.key,
                    handler = handler.name(),
                    attempts = retry.max_attempts,
                    error = %e,
                    "handler retries exhausted, dropping message"
                );
                metrics::counter!("bus_events_dropped").increment(1);
                return;
            }
        }
    }
}
