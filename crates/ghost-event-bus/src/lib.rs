//! Minimal pub/sub transport used by `ghost-ipc` to fan out IPC envelopes to
//! subscribers (CLI, dashboards, test harnesses) without coupling publishers
//! to any one consumer.

use async_trait::async_trait;
use tokio::sync::broadcast;

/// Marker bound for anything that can travel over a [`Bus`].
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}
impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> Event for T {}

/// A broadcast channel abstraction. Kept as a trait (rather than exposing
/// `tokio::sync::broadcast` directly) so callers can swap in a different
/// transport without touching publishers.
#[async_trait]
pub trait Bus<E: Event>: Send + Sync {
    fn publish(&self, event: E);
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// In-process broadcast bus. Lagging subscribers drop the oldest events
/// rather than blocking the publisher — callers that need every event
/// should drain their receiver promptly.
pub struct InMemoryBus<E: Event> {
    sender: broadcast::Sender<E>,
}

impl<E: Event> InMemoryBus<E> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl<E: Event> Bus<E> for InMemoryBus<E> {
    fn publish(&self, event: E) {
        // No subscribers is not an error: events published before the first
        // `subscribe()` call are simply not observed.
        let _ = self.sender.send(event);
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Bridges a broadcast receiver into an mpsc receiver, useful for callers
/// that want a single-consumer channel (e.g. a CLI tailing one task).
pub fn to_mpsc<E: Event>(mut rx: broadcast::Receiver<E>, buffer: usize) -> tokio::sync::mpsc::Receiver<E> {
    let (tx, out_rx) = tokio::sync::mpsc::channel(buffer);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(u32);

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = InMemoryBus::<Ping>::new(16);
        let mut rx = bus.subscribe();
        bus.publish(Ping(1));
        assert_eq!(rx.recv().await.unwrap(), Ping(1));
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_error() {
        let bus = InMemoryBus::<Ping>::new(4);
        bus.publish(Ping(1));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn to_mpsc_forwards_events_in_order() {
        let bus = InMemoryBus::<Ping>::new(16);
        let mut mpsc_rx = to_mpsc(bus.subscribe(), 16);
        bus.publish(Ping(1));
        bus.publish(Ping(2));
        assert_eq!(mpsc_rx.recv().await.unwrap(), Ping(1));
        assert_eq!(mpsc_rx.recv().await.unwrap(), Ping(2));
    }
}
