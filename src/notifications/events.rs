//! Notification events
//!
//! Events tell connected UI clients which records changed so they can
//! refetch. Each carries the IDs of the affected entities; for
//! `updateUser` / `updateWishlist` those are user IDs, otherwise the
//! changed resource IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// IDs of the entities affected by a change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIdsEvent {
    pub ids: Vec<String>,
}

impl EntityIdsEvent {
    pub fn one(id: impl Into<String>) -> Self {
        Self {
            ids: vec![id.into()],
        }
    }
}

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Event {
    /// A user's wishlist changed (ids = affected user IDs)
    UpdateWishlist(EntityIdsEvent),
    /// A user record changed, e.g. admin flag flipped — clients holding
    /// a session for that user should renovate their token
    UpdateUser(EntityIdsEvent),
    /// A product was created/updated/deleted
    UpdateProduct(EntityIdsEvent),
    /// A category or its product membership changed
    UpdateCategory(EntityIdsEvent),
    /// Reservations changed for a product
    UpdateReservations(EntityIdsEvent),
    /// Reviews changed for a product
    UpdateReviews(EntityIdsEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::UpdateWishlist(_) => "updateWishlist",
            Event::UpdateUser(_) => "updateUser",
            Event::UpdateProduct(_) => "updateProduct",
            Event::UpdateCategory(_) => "updateCategory",
            Event::UpdateReservations(_) => "updateReservations",
            Event::UpdateReviews(_) => "updateReviews",
        }
    }

    /// IDs of the affected entities
    pub fn ids(&self) -> &[String] {
        match self {
            Event::UpdateWishlist(e)
            | Event::UpdateUser(e)
            | Event::UpdateProduct(e)
            | Event::UpdateCategory(e)
            | Event::UpdateReservations(e)
            | Event::UpdateReviews(e) => &e.ids,
        }
    }
}

/// Envelope around an event with its broadcast timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub event: Event,
    pub timestamp: DateTime<Utc>,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names_match_wire_format() {
        let e = Event::UpdateWishlist(EntityIdsEvent::one("u1"));
        assert_eq!(e.event_type(), "updateWishlist");
        assert_eq!(e.ids(), ["u1".to_string()]);

        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "updateWishlist");
        assert_eq!(json["data"]["ids"][0], "u1");
    }
}
