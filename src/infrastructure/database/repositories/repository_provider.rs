//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::category::CategoryRepository;
use crate::domain::product::ProductRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::review::ReviewRepository;
use crate::domain::user::UserRepository;

use super::category_repository::SeaOrmCategoryRepository;
use super::product_repository::SeaOrmProductRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::review_repository::SeaOrmReviewRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let user = repos.users().find_by_email("ana@example.com").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    users: SeaOrmUserRepository,
    products: SeaOrmProductRepository,
    categories: SeaOrmCategoryRepository,
    reservations: SeaOrmReservationRepository,
    reviews: SeaOrmReviewRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            products: SeaOrmProductRepository::new(db.clone()),
            categories: SeaOrmCategoryRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            reviews: SeaOrmReviewRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn products(&self) -> &dyn ProductRepository {
        &self.products
    }

    fn categories(&self) -> &dyn CategoryRepository {
        &self.categories
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn reviews(&self) -> &dyn ReviewRepository {
        &self.reviews
    }
}
