//! Database entities

pub mod category;
pub mod product;
pub mod reservation;
pub mod review;
pub mod user;
