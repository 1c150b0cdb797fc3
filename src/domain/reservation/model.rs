//! Reservation domain entity

use chrono::{DateTime, Utc};

/// A booking of a product for a time range.
///
/// `start`/`end` are epoch milliseconds, matching what the booking UI
/// sends; the range is half-open (`start` inclusive, `end` exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    /// Check-in, epoch millis
    pub start: i64,
    /// Check-out, epoch millis
    pub end: i64,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(
        user_id: impl Into<String>,
        product_id: impl Into<String>,
        start: i64,
        end: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            product_id: product_id.into(),
            start,
            end,
            created_at: Utc::now(),
        }
    }

    /// Whether this reservation's time range overlaps another range.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start < end && start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_detection() {
        let r = Reservation::new("u1", "p1", 100, 200);
        assert!(r.overlaps(150, 250));
        assert!(r.overlaps(50, 150));
        assert!(r.overlaps(120, 180));
        assert!(r.overlaps(50, 250));
        // touching ranges do not overlap
        assert!(!r.overlaps(200, 300));
        assert!(!r.overlaps(0, 100));
    }
}
