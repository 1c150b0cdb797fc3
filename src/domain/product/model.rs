//! Product (listing) domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Street address of a listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub country: String,
    pub city: String,
    pub street: String,
}

/// A house policy entry shown on the listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub title: String,
    pub description: String,
}

/// A bookable property listing.
///
/// Category membership lives on the category side (its product-ID list),
/// so a product carries no category field of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Image URLs
    pub images: Vec<String>,
    /// Feature groups, each a list of feature labels
    pub features: Vec<Vec<String>>,
    pub address: Address,
    pub map_url: String,
    pub map_embed: String,
    pub policies: Vec<Policy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        address: Address,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            images: Vec::new(),
            features: Vec::new(),
            address,
            map_url: String::new(),
            map_embed: String::new(),
            policies: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
