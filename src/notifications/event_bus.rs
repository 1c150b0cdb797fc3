//! Event bus for broadcasting change notifications
//!
//! Uses a tokio broadcast channel so any number of websocket sessions
//! can subscribe. Slow subscribers that lag behind skip missed messages
//! instead of blocking publishers.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::events::{Event, EventMessage};

const CHANNEL_CAPACITY: usize = 1024;

/// Central event bus for notifications
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: Event) {
        let message = EventMessage::new(event);
        let receivers = self.sender.receiver_count();
        if receivers == 0 {
            debug!(
                event_type = message.event.event_type(),
                "No subscribers for event, dropping"
            );
            return;
        }
        match self.sender.send(message) {
            Ok(count) => {
                debug!(subscribers = count, "Event published");
            }
            Err(_) => {
                warn!("Failed to publish event: all subscribers dropped");
            }
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber handle for receiving events
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
}

impl EventSubscriber {
    /// Receive the next event, skipping over any lagged messages
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, skipping events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Shared event bus handle
pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::events::EntityIdsEvent;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        bus.publish(Event::UpdateProduct(EntityIdsEvent::one("p1")));

        let message = sub.recv().await.unwrap();
        assert_eq!(message.event.event_type(), "updateProduct");
        assert_eq!(message.event.ids(), ["p1".to_string()]);
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(Event::UpdateUser(EntityIdsEvent::one("u1")));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(Event::UpdateReviews(EntityIdsEvent::one("r1")));

        assert_eq!(a.recv().await.unwrap().event.event_type(), "updateReviews");
        assert_eq!(b.recv().await.unwrap().event.event_type(), "updateReviews");
    }
}
