//! Domain layer: entities and repository interfaces

pub mod category;
pub mod error;
pub mod product;
pub mod repositories;
pub mod reservation;
pub mod review;
pub mod user;

pub use category::Category;
pub use error::{DomainError, DomainResult};
pub use product::{Address, Policy, Product};
pub use repositories::RepositoryProvider;
pub use reservation::Reservation;
pub use review::Review;
pub use user::{User, UserProjection};
