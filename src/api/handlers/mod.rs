//! API Handlers

pub mod categories;
pub mod health;
pub mod metrics;
pub mod products;
pub mod reservations;
pub mod reviews;
pub mod users;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::auth::{AuthGateway, RateLimiter, TokenService};
use crate::domain::{DomainError, RepositoryProvider};
use crate::infrastructure::email::Mailer;
use crate::notifications::SharedEventBus;

/// Unified state for all REST routes. Axum extracts narrower states via
/// `FromRef` where a handler needs less.
#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub gateway: Arc<AuthGateway>,
    pub tokens: TokenService,
    pub rate_limiter: Arc<RateLimiter>,
    pub mailer: Arc<dyn Mailer>,
    pub event_bus: SharedEventBus,
    /// Base URL used to build confirmation links in emails
    pub public_url: String,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Build an error response with an explicit status
pub(crate) fn status_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::error(message)))
}

/// Require the caller's *stored* role to be admin. The token claim is
/// not trusted on its own, the live role decides.
pub(crate) async fn require_admin(
    state: &AppState,
    auth: &crate::auth::AuthenticatedUser,
) -> Result<(), ApiError> {
    if state
        .gateway
        .is_currently_admin(&auth.token)
        .await
        .map_err(domain_error)?
    {
        Ok(())
    } else {
        Err(status_error(StatusCode::UNAUTHORIZED, "Admin role required"))
    }
}

/// Map a domain error onto the HTTP status contract
pub(crate) fn domain_error(e: DomainError) -> ApiError {
    let status = match &e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    status_error(status, e.to_string())
}
