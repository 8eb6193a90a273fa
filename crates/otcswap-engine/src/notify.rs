//! Notification sinks for committed [`OfferEvent`]s.

use std::sync::{Mutex, PoisonError};

use otcswap_types::OfferEvent;

/// Receives every event of an operation after it fully succeeded.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: &OfferEvent);
}

/// Logs each event as structured JSON at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, event: &OfferEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(
                kind = event.kind(),
                offer = ?event.offer_id(),
                payload = %payload,
                "Offer event"
            ),
            Err(e) => tracing::warn!(kind = event.kind(), error = %e, "Unserializable event"),
        }
    }
}

/// Buffers events in memory, for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<OfferEvent>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<OfferEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take all buffered events, leaving the buffer empty.
    pub fn drain(&self) -> Vec<OfferEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl NotificationSink for MemorySink {
    fn publish(&self, event: &OfferEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _event: &OfferEvent) {}
}

#[cfg(test)]
mod tests {
    use otcswap_types::{OfferId, TokenId};

    use super::*;

    #[test]
    fn memory_sink_buffers_and_drains() {
        let sink = MemorySink::new();
        sink.publish(&OfferEvent::TokenDisabled {
            token_id: TokenId(1),
        });
        sink.publish(&OfferEvent::OfferCompleted {
            offer_id: OfferId(4),
        });
        assert_eq!(sink.events().len(), 2);
        let drained = sink.drain();
        assert_eq!(drained[1].offer_id(), Some(OfferId(4)));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn tracing_sink_does_not_panic() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        TracingSink.publish(&OfferEvent::OfferCompleted {
            offer_id: OfferId(0),
        });
        NullSink.publish(&OfferEvent::OfferCompleted {
            offer_id: OfferId(0),
        });
    }
}
