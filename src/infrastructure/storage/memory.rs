//! In-memory repository backend
//!
//! DashMap-backed implementation of every repository trait. Used by unit
//! and service-level tests; handy for local development without a
//! database file.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::category::CategoryRepository;
use crate::domain::product::ProductRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::review::ReviewRepository;
use crate::domain::user::{UserProjection, UserRepository};
use crate::domain::{Address, Category, DomainResult, Product, Reservation, Review, User};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: DashMap<String, User>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn save(&self, user: User) -> DomainResult<()> {
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let needle = email.to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == needle)
            .map(|u| u.clone()))
    }

    async fn find_all_projected(&self) -> DomainResult<Vec<UserProjection>> {
        Ok(self
            .users
            .iter()
            .map(|u| UserProjection::from(u.clone()))
            .collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.users.len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryProductRepository {
    products: DashMap<String, Product>,
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn save(&self, product: Product) -> DomainResult<()> {
        self.products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Product>> {
        Ok(self.products.get(id).map(|p| p.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Product>> {
        Ok(self.products.iter().map(|p| p.clone()).collect())
    }

    async fn find_by_country_city(
        &self,
        country: &str,
        city: &str,
    ) -> DomainResult<Vec<Product>> {
        let country = country.to_lowercase();
        let city = city.to_lowercase();
        Ok(self
            .products
            .iter()
            .filter(|p| {
                p.address.country.to_lowercase() == country
                    && p.address.city.to_lowercase() == city
            })
            .map(|p| p.clone())
            .collect())
    }

    async fn find_all_addresses(&self) -> DomainResult<Vec<Address>> {
        let mut addresses: Vec<Address> = Vec::new();
        for p in self.products.iter() {
            if !addresses.contains(&p.address) {
                addresses.push(p.address.clone());
            }
        }
        Ok(addresses)
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.products.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCategoryRepository {
    categories: DashMap<String, Category>,
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    async fn save(&self, category: Category) -> DomainResult<()> {
        self.categories.insert(category.id.clone(), category);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Category>> {
        Ok(self.categories.get(id).map(|c| c.clone()))
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Category>> {
        Ok(self
            .categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.clone()))
    }

    async fn find_by_product(&self, product_id: &str) -> DomainResult<Option<Category>> {
        Ok(self
            .categories
            .iter()
            .find(|c| c.contains_product(product_id))
            .map(|c| c.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Category>> {
        Ok(self.categories.iter().map(|c| c.clone()).collect())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.categories.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryReservationRepository {
    reservations: DashMap<String, Reservation>,
}

#[async_trait]
impl ReservationRepository for MemoryReservationRepository {
    async fn save(&self, reservation: Reservation) -> DomainResult<()> {
        self.reservations
            .insert(reservation.id.clone(), reservation);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(id).map(|r| r.clone()))
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn find_by_product(&self, product_id: &str) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.reservations.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryReviewRepository {
    reviews: DashMap<String, Review>,
}

#[async_trait]
impl ReviewRepository for MemoryReviewRepository {
    async fn save(&self, review: Review) -> DomainResult<()> {
        self.reviews.insert(review.id.clone(), review);
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<Review>> {
        Ok(self
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn find_by_product(&self, product_id: &str) -> DomainResult<Vec<Review>> {
        Ok(self
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn find_by_user_and_product(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> DomainResult<Option<Review>> {
        Ok(self
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.product_id == product_id)
            .map(|r| r.clone()))
    }
}

/// In-memory [`RepositoryProvider`]
#[derive(Default)]
pub struct MemoryRepositoryProvider {
    users: MemoryUserRepository,
    products: MemoryProductRepository,
    categories: MemoryCategoryRepository,
    reservations: MemoryReservationRepository,
    reviews: MemoryReviewRepository,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for MemoryRepositoryProvider {
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
