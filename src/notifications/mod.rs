//! Real-time change notifications
//!
//! Handlers publish events to the bus after successful mutations and
//! the websocket endpoint streams them to connected clients.

pub mod event_bus;
pub mod events;
pub mod websocket;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::{EntityIdsEvent, Event, EventMessage};
pub use websocket::{create_notification_state, ws_notifications_handler, NotificationState};
