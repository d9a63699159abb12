//! Lifecycle event broadcaster
//!
//! A single tokio broadcast channel fans events out to per-subscriber
//! relay tasks. Publishing never blocks and never fails the operation
//! that produced the event; with no subscribers the send error is
//! simply dropped. A slow subscriber loses old events (Lagged) rather
//! than stalling anyone else.

use shared::order::LifecycleEvent;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Per-subscriber buffer between the relay task and the consumer
const SUBSCRIBER_BUFFER: usize = 64;

#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers. Best-effort.
    pub fn publish(&self, event: LifecycleEvent) {
        tracing::debug!(event = %event, "Publishing lifecycle event");
        if self.tx.send(event).is_err() {
            tracing::trace!("No active event subscribers");
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Subscribe with a filter predicate.
    ///
    /// A relay task applies the predicate and forwards matches into a
    /// bounded buffer; if the consumer falls behind, further events are
    /// dropped for it (it will catch up via resync).
    pub fn subscribe<F>(&self, predicate: F) -> Subscription
    where
        F: Fn(&LifecycleEvent) -> bool + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let (out_tx, out_rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let token = CancellationToken::new();
        let task_token = token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    result = rx.recv() => match result {
                        Ok(event) => {
                            if !predicate(&event) {
                                continue;
                            }
                            if out_tx.try_send(event).is_err() {
                                tracing::warn!("Subscriber buffer full, dropping event");
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Event subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Subscription { rx: out_rx, token }
    }
}

/// A filtered event stream. Dropping it cancels the relay task.
pub struct Subscription {
    rx: mpsc::Receiver<LifecycleEvent>,
    token: CancellationToken,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }

    pub fn unsubscribe(&self) {
        self.token.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
