//! Category domain entity

use chrono::{DateTime, Utc};

/// A listing category (e.g. "Hoteles", "Apartamentos").
///
/// Owns the membership relation: `products` holds the IDs of listings
/// belonging to this category. A product belongs to at most one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    /// Unique category name
    pub name: String,
    pub description: String,
    /// Cover image URL
    pub image: String,
    /// IDs of member products
    pub products: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            image: String::new(),
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.products.iter().any(|p| p == product_id)
    }

    /// Add a product ID to the membership list (no-op if already present)
    pub fn add_product(&mut self, product_id: &str) {
        if !self.contains_product(product_id) {
            self.products.push(product_id.to_string());
        }
    }

    /// Remove a product ID from the membership list (no-op if absent)
    pub fn remove_product(&mut self, product_id: &str) {
        self.products.retain(|p| p != product_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_add_and_remove() {
        let mut c = Category::new("Hoteles", "Hoteles y resorts");
        c.add_product("p1");
        c.add_product("p1");
        assert_eq!(c.products, vec!["p1"]);
        assert!(c.contains_product("p1"));

        c.remove_product("p1");
        assert!(c.products.is_empty());
        c.remove_product("p1"); // idempotent
    }
}
