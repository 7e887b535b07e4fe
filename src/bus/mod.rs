//! Event bus for live updates
//!
//! Uses tokio::sync::broadcast for pub/sub. The SSE endpoint forwards every
//! event to connected browsers; pollers publish state changes here.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::model::MeterReading;

/// Event types that can be published on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BusEvent {
    // Gateway monitor
    GatewayStatusChanged {
        gateway_id: String,
        online: bool,
    },

    // Live M-Bus reader
    ReaderStateChanged {
        gateway_id: String,
        state: String,
    },
    LiveReading {
        gateway_id: String,
        reading: MeterReading,
    },

    // Write actions
    RecordCreated {
        kind: String,
        id: String,
    },
    RecordDeleted {
        kind: String,
        id: String,
    },

    // Console sessions
    SessionStarted {
        username: String,
    },
    SessionEnded {
        username: String,
    },
}

/// Event bus handle for publishing and subscribing
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: BusEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

pub type SharedBus = Arc<EventBus>;

pub fn create_bus() -> SharedBus {
    Arc::new(EventBus::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pubsub() {
        let bus = create_bus();
        let mut rx = bus.subscribe();

        bus.publish(BusEvent::GatewayStatusChanged {
            gateway_id: "gw-1".to_string(),
            online: true,
        });

        match rx.recv().await.unwrap() {
            BusEvent::GatewayStatusChanged { gateway_id, online } => {
                assert_eq!(gateway_id, "gw-1");
                assert!(online);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = create_bus();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(BusEvent::SessionEnded {
            username: "ops".to_string(),
        });

        assert!(matches!(rx1.recv().await.unwrap(), BusEvent::SessionEnded { .. }));
        assert!(matches!(rx2.recv().await.unwrap(), BusEvent::SessionEnded { .. }));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(BusEvent::RecordDeleted {
            kind: "goal".to_string(),
            id: "7".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "RecordDeleted");
        assert_eq!(json["payload"]["id"], "7");
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = create_bus();
        bus.publish(BusEvent::SessionStarted {
            username: "ops".to_string(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
