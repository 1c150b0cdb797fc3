//! # SmartStay Booking Backend
//!
//! REST backend for a property booking site.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities and repository traits
//! - **auth**: JWT tokens, password hashing, rate limiting, auth gateway
//! - **infrastructure**: External concerns (database, email, in-memory storage)
//! - **notifications**: Real-time WebSocket notifications for UI
//! - **api**: REST API with Swagger documentation

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::database::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export auth services
pub use auth::{AuthGateway, RateLimiter, TokenService};

// Re-export API router
pub use api::{create_api_router, AppState};

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
