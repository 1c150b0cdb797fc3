//! Product repository interface

use async_trait::async_trait;

use super::model::{Address, Product};
use crate::domain::DomainResult;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert or update a product
    async fn save(&self, product: Product) -> DomainResult<()>;

    /// Find product by ID
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Product>>;

    /// All products
    async fn find_all(&self) -> DomainResult<Vec<Product>>;

    /// Products matching country and city (both exact, case-insensitive)
    async fn find_by_country_city(&self, country: &str, city: &str)
        -> DomainResult<Vec<Product>>;

    /// Distinct addresses across all products
    async fn find_all_addresses(&self) -> DomainResult<Vec<Address>>;

    /// Delete a product by ID; Ok even when nothing matched
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
