//! API DTOs

pub mod common;

pub use common::{ApiResponse, EmptyData};
