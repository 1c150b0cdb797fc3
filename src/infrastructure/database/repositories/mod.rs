//! SeaORM repository implementations

pub mod category_repository;
pub mod product_repository;
pub mod repository_provider;
pub mod reservation_repository;
pub mod review_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use crate::domain::DomainError;

/// Map a database error onto the domain taxonomy. Unique-constraint
/// violations become conflicts so handlers can answer 409.
pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    let msg = e.to_string();
    if msg.contains("UNIQUE") {
        DomainError::Conflict(msg)
    } else {
        DomainError::Storage(msg)
    }
}

/// Encode a list-shaped field into its JSON text column
pub(crate) fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, DomainError> {
    serde_json::to_string(value).map_err(|e| DomainError::Storage(format!("JSON encode: {}", e)))
}

/// Decode a JSON text column, tolerating legacy empty values
pub(crate) fn decode_json<T: serde::de::DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}
