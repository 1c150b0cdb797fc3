//! Authentication and authorization module
//!
//! Password hashing, session/confirmation tokens, the login/register
//! rate limiter, and the gateway that ties tokens to live identities.

pub mod gateway;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod rate_limit;

pub use gateway::AuthGateway;
pub use jwt::{JwtConfig, SessionClaims, TokenService};
pub use middleware::{auth_middleware, client_ip, AuthState, AuthenticatedUser};
pub use password::{hash_password, verify_password};
pub use rate_limit::RateLimiter;
