use crate::envelope::Envelope;
use ghost_event_bus::InMemoryBus;
use std::time::Duration;
use tokio::sync::broadcast;

/// The single bus every observable event (QUEUE, STATE, SCHEDULER, SUBTASK)
/// travels over. The in-process stream itself is never throttled; only
/// [`ThrottledStatusView`] applies the 2 Hz subscriber-view cap.
pub type StatusBus = InMemoryBus<Envelope>;

/// A subscriber view that coalesces a bursty status stream down to at most
/// one envelope per `interval` (the 2 Hz default), always yielding the most
/// recently received envelope rather than the oldest.
pub struct ThrottledStatusView {
    rx: broadcast::Receiver<Envelope>,
    interval: Duration,
}

impl ThrottledStatusView {
    pub fn new(rx: broadcast::Receiver<Envelope>, hz: u32) -> Self {
        let hz = hz.max(1);
        Self { rx, interval: Duration::from_millis(1000 / hz as u64) }
    }

    /// Waits for the next envelope, then drains any further envelopes that
    /// arrive within `interval` and returns only the last one seen.
    pub async fn next(&mut self) -> Option<Envelope> {
        let mut latest = match self.rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => return self.next_boxed().await,
            Err(broadcast::error::RecvError::Closed) => return None,
        };
        let deadline = tokio::time::Instant::now() + self.interval;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, self.rx.recv()).await {
                Ok(Ok(event)) => latest = event,
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) => break,
                Err(_elapsed) => break,
            }
        }
        Some(latest)
    }

    fn next_boxed<'a>(&'a mut self) -> std::pin::Pin<Box<dyn std::future::Future<Output = Option<Envelope>> + Send + 'a>> {
        Box::pin(self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{IpcPayload, NavigatePayload};
    use ghost_core_types::{ContextId, TaskId};
    use ghost_event_bus::Bus;

    fn sample() -> Envelope {
        Envelope::new(
            TaskId::new(),
            ContextId::new(),
            IpcPayload::Navigate(NavigatePayload { url: "https://example.com".into(), timeout_ms: 1000 }),
        )
    }

    #[tokio::test]
    async fn throttled_view_coalesces_bursts_to_latest() {
        let bus = StatusBus::new(16);
        let mut view = ThrottledStatusView::new(bus.subscribe(), 2);
        let first = sample();
        let second = sample();
        let second_id = second.message_id.clone();
        {
            use ghost_event_bus::Bus;
            bus.publish(first);
            bus.publish(second);
        }
        let observed = view.next().await.unwrap();
        assert_eq!(observed.message_id, second_id);
    }
}
