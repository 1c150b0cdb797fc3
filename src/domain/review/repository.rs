//! Review repository interface

use async_trait::async_trait;

use super::model::Review;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a new review
    async fn save(&self, review: Review) -> DomainResult<()>;

    /// All reviews written by a user
    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<Review>>;

    /// All reviews of a product
    async fn find_by_product(&self, product_id: &str) -> DomainResult<Vec<Review>>;

    /// The review a user left on a product, if any
    async fn find_by_user_and_product(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> DomainResult<Option<Review>>;
}
