//! Reservation repository interface

use async_trait::async_trait;

use super::model::Reservation;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation
    async fn save(&self, reservation: Reservation) -> DomainResult<()>;

    /// Find reservation by ID
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>>;

    /// All reservations made by a user
    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<Reservation>>;

    /// All reservations for a product (for overlap checks)
    async fn find_by_product(&self, product_id: &str) -> DomainResult<Vec<Reservation>>;

    /// Delete a reservation by ID; Ok even when nothing matched
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
