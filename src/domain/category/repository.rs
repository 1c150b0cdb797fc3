//! Category repository interface

use async_trait::async_trait;

use super::model::Category;
use crate::domain::DomainResult;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert or update a category
    async fn save(&self, category: Category) -> DomainResult<()>;

    /// Find category by ID
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Category>>;

    /// Find category by its unique name
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Category>>;

    /// The category whose product list contains the given product ID
    async fn find_by_product(&self, product_id: &str) -> DomainResult<Option<Category>>;

    /// All categories
    async fn find_all(&self) -> DomainResult<Vec<Category>>;

    /// Delete a category by ID; Ok even when nothing matched
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
