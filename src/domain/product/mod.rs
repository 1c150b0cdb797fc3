//! Product aggregate

pub mod model;
pub mod repository;

pub use model::{Address, Policy, Product};
pub use repository::ProductRepository;
