use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after state transitions commit.
///
/// Consumers observe the transition; they never participate in it, so a
/// slow or dead consumer cannot affect request handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        user_id: Uuid,
    },
    PaymentInitialized {
        order_id: Uuid,
        reference: String,
    },
    PaymentConfirmed {
        order_id: Uuid,
        reference: String,
    },
    OrderStatusUpdated {
        order_id: Uuid,
        status: String,
    },
    UserRegistered {
        user_id: Uuid,
    },
}

/// Envelope carrying the event plus emission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: Event,
    pub occurred_at: DateTime<Utc>,
}

/// Cloneable sending half handed to services.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<EventEnvelope>,
}

impl EventSender {
    pub fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// Best-effort send. A full or closed channel is logged and dropped;
    /// events are observability, not part of the transaction.
    pub async fn send(&self, event: Event) {
        let envelope = EventEnvelope {
            event,
            occurred_at: Utc::now(),
        };
        if let Err(e) = self.tx.send(envelope).await {
            warn!("Failed to send event: {}", e);
        }
    }
}

/// Create a bounded event channel.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<EventEnvelope>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drain the event channel, logging each event as structured output.
/// Runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<EventEnvelope>) {
    while let Some(envelope) = rx.recv().await {
        match serde_json::to_string(&envelope.event) {
            Ok(json) => info!(occurred_at = %envelope.occurred_at, event = %json, "Domain event"),
            Err(e) => warn!("Failed to serialize event: {}", e),
        }
    }
    info!("Event channel closed, consumer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_events_in_order() {
        let (sender, mut rx) = event_channel(8);
        let order_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        sender.send(Event::OrderCreated { order_id, user_id }).await;
        sender
            .send(Event::PaymentInitialized {
                order_id,
                reference: "ref_123".to_string(),
            })
            .await;

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.event, Event::OrderCreated { .. }));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.event, Event::PaymentInitialized { .. }));
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_does_not_panic() {
        let (sender, rx) = event_channel(1);
        drop(rx);
        sender
            .send(Event::UserRegistered {
                user_id: Uuid::new_v4(),
            })
            .await;
    }
}
