//! Review domain entity

use chrono::{DateTime, Utc};

/// A user's review of a product. One review per user per product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    /// Star rating, 1 to 5
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        user_id: impl Into<String>,
        product_id: impl Into<String>,
        rating: i32,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            product_id: product_id.into(),
            rating,
            comment: comment.into(),
            created_at: Utc::now(),
        }
    }
}
