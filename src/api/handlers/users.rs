//! User REST API handlers
//!
//! Carries the account lifecycle: registration with email confirmation,
//! login, token validation/renovation, wishlist, profile updates and the
//! admin-flag endpoint. Registration and login are rate limited per
//! client IP.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::api::dto::{ApiResponse, EmptyData};
use crate::api::handlers::reservations::ReservationDto;
use crate::api::handlers::reviews::ReviewDto;
use crate::api::handlers::{domain_error, require_admin, status_error, ApiError, AppState};
use crate::auth::{client_ip, hash_password, verify_password, AuthenticatedUser};
use crate::domain::{DomainError, User, UserProjection};
use crate::infrastructure::email::templates;
use crate::notifications::{EntityIdsEvent, Event};
use crate::shared::validation::{is_valid_email, is_valid_name, is_valid_password};

/// Body returned by the idempotent confirmation endpoint
const CONFIRM_BODY: &str =
    "Bienvenido a SmartStay: ya puedes volver a nuestra pagina web y Loguearte";

/// Read view of a user, credential stripped
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_confirmed: bool,
}

impl From<UserProjection> for UserDto {
    fn from(p: UserProjection) -> Self {
        Self {
            id: p.id,
            email: p.email,
            first_name: p.first_name,
            last_name: p.last_name,
            is_admin: p.is_admin,
            is_confirmed: p.is_confirmed,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session token payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Profile name update
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNameRequest {
    pub first_name: String,
    pub last_name: String,
}

/// Password change request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Admin-flag change request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAdminRequest {
    pub user_id: String,
    pub is_admin: bool,
}

/// Load the caller behind a validated token, 401 when the identity has
/// disappeared since issuance
async fn require_user(state: &AppState, auth: &AuthenticatedUser) -> Result<User, ApiError> {
    state
        .repos
        .users()
        .find_by_id(&auth.user_id)
        .await
        .map_err(domain_error)?
        .ok_or_else(|| status_error(StatusCode::UNAUTHORIZED, "Unknown user"))
}

/// Issue a confirmation token and send the welcome email. Delivery
/// failures are logged, never surfaced to the registering client.
async fn send_confirmation_email(state: &AppState, user: &User) {
    let token = match state.tokens.issue_confirmation(&user.email) {
        Ok(t) => t,
        Err(e) => {
            warn!("Failed to issue confirmation token: {}", e);
            return;
        }
    };
    let link = format!("{}/api/users/confirm/{}", state.public_url, token);
    let html = templates::render(
        templates::WELCOME_TEMPLATE,
        &[("name", user.first_name.as_str()), ("confirmationLink", &link)],
    );
    if let Err(e) = state
        .mailer
        .send(&user.email, templates::WELCOME_SUBJECT, &html)
        .await
    {
        warn!("Failed to send confirmation email to {}: {}", user.email, e);
    }
}

/// List all users (admin only, projected)
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Projected user list", body = ApiResponse<Vec<UserDto>>),
        (status = 401, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    require_admin(&state, &auth).await?;

    let users = state
        .repos
        .users()
        .find_all_projected()
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(Into::into).collect(),
    )))
}

/// Validate the session token against live identity state
///
/// 202 signals that the embedded admin claim no longer matches the
/// stored role and the client should renovate its token.
#[utoipa::path(
    get,
    path = "/api/users/validate",
    tag = "Users",
    responses(
        (status = 200, description = "Token valid and current"),
        (status = 202, description = "Token valid but role claim is stale, renovate"),
        (status = 401, description = "Invalid token or unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn validate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<(StatusCode, Json<ApiResponse<EmptyData>>), ApiError> {
    if state
        .gateway
        .resolve_identity(&auth.token)
        .await
        .map_err(domain_error)?
        .is_none()
    {
        return Err(status_error(StatusCode::UNAUTHORIZED, "Unknown user"));
    }

    if state
        .gateway
        .detect_stale_admin_claim(&auth.token)
        .await
        .map_err(domain_error)?
    {
        return Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(EmptyData {}))));
    }
    Ok((StatusCode::OK, Json(ApiResponse::success(EmptyData {}))))
}

/// Exchange a valid session token for a freshly minted one
#[utoipa::path(
    get,
    path = "/api/users/renovate",
    tag = "Users",
    responses(
        (status = 200, description = "Fresh session token", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid token or unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn renovate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let user = require_user(&state, &auth).await?;
    let token = state
        .tokens
        .issue_session(&user)
        .map_err(|e| status_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(ApiResponse::success(TokenResponse { token })))
}

/// Caller's wishlist (product IDs)
#[utoipa::path(
    get,
    path = "/api/users/wishlist",
    tag = "Users",
    responses(
        (status = 200, description = "Wishlisted product IDs", body = ApiResponse<Vec<String>>),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let user = require_user(&state, &auth).await?;
    Ok(Json(ApiResponse::success(user.wishlist)))
}

/// Add a product to the caller's wishlist
#[utoipa::path(
    post,
    path = "/api/users/wishlist/add/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Added"),
        (status = 404, description = "Unknown product"),
        (status = 409, description = "Already wishlisted"),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn wishlist_add(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(product_id): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    let mut user = require_user(&state, &auth).await?;

    if state
        .repos
        .products()
        .find_by_id(&product_id)
        .await
        .map_err(domain_error)?
        .is_none()
    {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown product"));
    }
    if user.wishlist.iter().any(|p| p == &product_id) {
        return Err(status_error(StatusCode::CONFLICT, "Already wishlisted"));
    }

    user.wishlist.push(product_id);
    user.updated_at = Utc::now();
    let user_id = user.id.clone();
    state.repos.users().save(user).await.map_err(domain_error)?;

    state
        .event_bus
        .publish(Event::UpdateWishlist(EntityIdsEvent::one(user_id)));
    Ok(Json(ApiResponse::success(EmptyData {})))
}

/// Remove a product from the caller's wishlist (idempotent)
#[utoipa::path(
    delete,
    path = "/api/users/wishlist/remove/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Removed (or was absent)"),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn wishlist_remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(product_id): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    let mut user = require_user(&state, &auth).await?;

    user.wishlist.retain(|p| p != &product_id);
    user.updated_at = Utc::now();
    let user_id = user.id.clone();
    state.repos.users().save(user).await.map_err(domain_error)?;

    state
        .event_bus
        .publish(Event::UpdateWishlist(EntityIdsEvent::one(user_id)));
    Ok(Json(ApiResponse::success(EmptyData {})))
}

/// Register a new account
///
/// Creates an unconfirmed non-admin user and sends the confirmation
/// email. Registering an existing unconfirmed email resends the link
/// (202); a confirmed email conflicts (409).
#[utoipa::path(
    post,
    path = "/api/users/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, confirmation email sent"),
        (status = 202, description = "Email already registered but unconfirmed, link resent"),
        (status = 400, description = "Invalid email, password or name"),
        (status = 409, description = "Email already registered and confirmed"),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EmptyData>>), ApiError> {
    let ip = client_ip(&headers, peer);
    if !state.rate_limiter.check(&ip) {
        return Err(status_error(StatusCode::TOO_MANY_REQUESTS, "Too many requests"));
    }

    if !is_valid_email(&req.email)
        || !is_valid_password(&req.password)
        || !is_valid_name(&req.first_name)
        || !is_valid_name(&req.last_name)
    {
        return Err(status_error(StatusCode::BAD_REQUEST, "Invalid registration data"));
    }

    if let Some(existing) = state
        .repos
        .users()
        .find_by_email(&req.email)
        .await
        .map_err(domain_error)?
    {
        if !existing.is_confirmed {
            send_confirmation_email(&state, &existing).await;
            return Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(EmptyData {}))));
        }
        return Err(status_error(StatusCode::CONFLICT, "Email already registered"));
    }

    let user = User::new(
        req.email,
        req.first_name,
        req.last_name,
        hash_password(&req.password),
    );
    state
        .repos
        .users()
        .save(user.clone())
        .await
        .map_err(domain_error)?;
    info!("User registered: {}", user.email);

    send_confirmation_email(&state, &user).await;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(EmptyData {}))))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid email or password shape"),
        (status = 401, description = "Wrong password"),
        (status = 403, description = "Email not confirmed"),
        (status = 404, description = "Unknown email"),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let ip = client_ip(&headers, peer);
    if !state.rate_limiter.check(&ip) {
        return Err(status_error(StatusCode::TOO_MANY_REQUESTS, "Too many requests"));
    }

    if !is_valid_email(&req.email) || !is_valid_password(&req.password) {
        return Err(status_error(StatusCode::BAD_REQUEST, "Invalid credentials shape"));
    }

    let Some(user) = state
        .repos
        .users()
        .find_by_email(&req.email)
        .await
        .map_err(domain_error)?
    else {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown email"));
    };

    if !verify_password(&req.password, &user.credential) {
        return Err(status_error(StatusCode::UNAUTHORIZED, "Wrong password"));
    }
    if !user.is_confirmed {
        return Err(status_error(StatusCode::FORBIDDEN, "Email not confirmed"));
    }

    let token = state
        .tokens
        .issue_session(&user)
        .map_err(|e| status_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    info!("User logged in: {}", user.email);
    Ok(Json(ApiResponse::success(TokenResponse { token })))
}

/// Confirm an email address via the token from the welcome email
///
/// Idempotent: confirming twice answers 200 both times. The body is the
/// human-readable welcome text shown in the browser.
#[utoipa::path(
    get,
    path = "/api/users/confirm/{token}",
    tag = "Users",
    params(("token" = String, Path, description = "Confirmation token")),
    responses(
        (status = 200, description = "Email confirmed"),
        (status = 401, description = "Invalid confirmation token"),
        (status = 404, description = "No account for the confirmed email")
    )
)]
pub async fn confirm_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> (StatusCode, String) {
    let Some(email) = state.tokens.confirmation_email(&token) else {
        return (StatusCode::UNAUTHORIZED, "null".to_string());
    };

    match state.repos.users().find_by_email(&email).await {
        Ok(Some(mut user)) => {
            if !user.is_confirmed {
                user.is_confirmed = true;
                user.updated_at = Utc::now();
                if let Err(e) = state.repos.users().save(user).await {
                    warn!("Failed to persist confirmation for {}: {}", email, e);
                    return (StatusCode::INTERNAL_SERVER_ERROR, "null".to_string());
                }
                info!("Email confirmed: {}", email);
            }
            (StatusCode::OK, CONFIRM_BODY.to_string())
        }
        Ok(None) => (StatusCode::NOT_FOUND, CONFIRM_BODY.to_string()),
        Err(e) => {
            warn!("Confirmation lookup failed for {}: {}", email, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "null".to_string())
        }
    }
}

/// Update the caller's first and last name
///
/// Answers with a freshly minted session token.
#[utoipa::path(
    post,
    path = "/api/users/update/name",
    tag = "Users",
    request_body = UpdateNameRequest,
    responses(
        (status = 200, description = "New session token", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid names"),
        (status = 401, description = "Invalid token"),
        (status = 404, description = "Unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_name(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<UpdateNameRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    if !is_valid_name(&req.first_name) || !is_valid_name(&req.last_name) {
        return Err(status_error(StatusCode::BAD_REQUEST, "Invalid name"));
    }

    let Some(mut user) = state
        .repos
        .users()
        .find_by_id(&auth.user_id)
        .await
        .map_err(domain_error)?
    else {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown user"));
    };

    user.first_name = req.first_name;
    user.last_name = req.last_name;
    user.updated_at = Utc::now();
    state
        .repos
        .users()
        .save(user.clone())
        .await
        .map_err(domain_error)?;

    let token = state
        .tokens
        .issue_session(&user)
        .map_err(|e| status_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(ApiResponse::success(TokenResponse { token })))
}

/// Change the caller's password
///
/// Requires the old password; the mismatch status (418) is the contract
/// the frontend already relies on.
#[utoipa::path(
    post,
    path = "/api/users/update/password",
    tag = "Users",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed, notification email sent"),
        (status = 400, description = "Invalid new password"),
        (status = 401, description = "Invalid token"),
        (status = 404, description = "Unknown user"),
        (status = 418, description = "Old password does not match")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    if !is_valid_password(&req.new_password) {
        return Err(status_error(StatusCode::BAD_REQUEST, "Invalid new password"));
    }

    let Some(mut user) = state
        .repos
        .users()
        .find_by_id(&auth.user_id)
        .await
        .map_err(domain_error)?
    else {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown user"));
    };

    if !verify_password(&req.old_password, &user.credential) {
        return Err(status_error(StatusCode::IM_A_TEAPOT, "Old password mismatch"));
    }

    user.credential = hash_password(&req.new_password);
    user.updated_at = Utc::now();
    state
        .repos
        .users()
        .save(user.clone())
        .await
        .map_err(domain_error)?;
    info!("Password updated: {}", user.email);

    let html = templates::render(
        templates::PASSWORD_UPDATED_TEMPLATE,
        &[("name", user.first_name.as_str())],
    );
    if let Err(e) = state
        .mailer
        .send(&user.email, templates::PASSWORD_UPDATED_SUBJECT, &html)
        .await
    {
        warn!("Failed to send password email to {}: {}", user.email, e);
    }

    Ok(Json(ApiResponse::success(EmptyData {})))
}

/// Set another user's admin flag (admin only)
///
/// Self-targeting is rejected so an admin cannot lock themselves out.
#[utoipa::path(
    post,
    path = "/api/users/update/set-admin",
    tag = "Users",
    request_body = SetAdminRequest,
    responses(
        (status = 200, description = "Flag persisted"),
        (status = 400, description = "Malformed or self target"),
        (status = 401, description = "Caller is not an admin"),
        (status = 404, description = "Unknown target user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<SetAdminRequest>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    require_admin(&state, &auth).await?;
    if req.user_id.trim().is_empty() {
        return Err(status_error(StatusCode::BAD_REQUEST, "Malformed target id"));
    }

    let acting = require_user(&state, &auth).await?;
    let updated = state
        .gateway
        .set_admin_flag(&acting, &req.user_id, req.is_admin)
        .await
        .map_err(|e| match e {
            DomainError::Validation(_) => status_error(StatusCode::BAD_REQUEST, e.to_string()),
            other => domain_error(other),
        })?;

    state
        .event_bus
        .publish(Event::UpdateUser(EntityIdsEvent::one(updated.id)));
    Ok(Json(ApiResponse::success(EmptyData {})))
}

/// Caller's reservations
#[utoipa::path(
    get,
    path = "/api/users/reservations",
    tag = "Users",
    responses(
        (status = 200, description = "Caller's reservations", body = ApiResponse<Vec<ReservationDto>>),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_reservations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<ReservationDto>>>, ApiError> {
    let reservations = state
        .repos
        .reservations()
        .find_by_user(&auth.user_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        reservations.into_iter().map(Into::into).collect(),
    )))
}

/// Caller's reviews
#[utoipa::path(
    get,
    path = "/api/users/reviews",
    tag = "Users",
    responses(
        (status = 200, description = "Caller's reviews", body = ApiResponse<Vec<ReviewDto>>),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_reviews(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<ReviewDto>>>, ApiError> {
    let reviews = state
        .repos
        .reviews()
        .find_by_user(&auth.user_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        reviews.into_iter().map(Into::into).collect(),
    )))
}

/// Public display name of a user
///
/// Names are only public for confirmed users who have posted at least
/// one review; everyone else answers 404 to avoid account probing.
#[utoipa::path(
    get,
    path = "/api/users/name/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Full name", body = ApiResponse<String>),
        (status = 404, description = "Unknown, unconfirmed or reviewless user")
    )
)]
pub async fn get_name(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let Some(user) = state
        .repos
        .users()
        .find_by_id(&id)
        .await
        .map_err(domain_error)?
    else {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown user"));
    };

    if !user.is_confirmed {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown user"));
    }

    let reviews = state
        .repos
        .reviews()
        .find_by_user(&id)
        .await
        .map_err(domain_error)?;
    if reviews.is_empty() {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown user"));
    }

    Ok(Json(ApiResponse::success(user.full_name())))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{AuthGateway, JwtConfig, RateLimiter, TokenService};
    use crate::infrastructure::email::testing::CapturingMailer;
    use crate::infrastructure::storage::MemoryRepositoryProvider;
    use crate::notifications::create_event_bus;

    fn test_state() -> (AppState, Arc<CapturingMailer>) {
        let repos: Arc<dyn crate::domain::RepositoryProvider> =
            Arc::new(MemoryRepositoryProvider::new());
        let tokens = TokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            session_ttl_hours: 1,
            confirmation_ttl_hours: 1,
            issuer: "smartstay-test".to_string(),
        });
        let mailer = Arc::new(CapturingMailer::new());
        let state = AppState {
            repos: Arc::clone(&repos),
            gateway: Arc::new(AuthGateway::new(tokens.clone(), Arc::clone(&repos))),
            tokens,
            rate_limiter: Arc::new(RateLimiter::new(60, 1000)),
            mailer: mailer.clone(),
            event_bus: create_event_bus(),
            public_url: "http://localhost:8080".to_string(),
        };
        (state, mailer)
    }

    fn peer() -> ConnectInfo<SocketAddr> {
        ConnectInfo("127.0.0.1:50000".parse().unwrap())
    }

    async fn do_register(state: &AppState, email: &str, password: &str) -> StatusCode {
        match register(
            State(state.clone()),
            peer(),
            HeaderMap::new(),
            Json(RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
                first_name: "Ana".to_string(),
                last_name: "García".to_string(),
            }),
        )
        .await
        {
            Ok((status, _)) => status,
            Err((status, _)) => status,
        }
    }

    async fn do_login(state: &AppState, email: &str, password: &str) -> Result<String, StatusCode> {
        match login(
            State(state.clone()),
            peer(),
            HeaderMap::new(),
            Json(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            }),
        )
        .await
        {
            Ok(Json(resp)) => Ok(resp.data.unwrap().token),
            Err((status, _)) => Err(status),
        }
    }

    fn confirmation_token(mailer: &CapturingMailer) -> String {
        let sent = mailer.sent();
        let body = &sent.last().unwrap().html_body;
        let marker = "/api/users/confirm/";
        let start = body.find(marker).unwrap() + marker.len();
        let rest = &body[start..];
        let end = rest.find('"').unwrap();
        rest[..end].to_string()
    }

    #[tokio::test]
    async fn register_confirm_login_flow() {
        let (state, mailer) = test_state();

        // register: account created, confirmation email out
        assert_eq!(do_register(&state, "a@b.com", "longpassword1").await, StatusCode::CREATED);
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].subject, templates::WELCOME_SUBJECT);

        // login before confirmation is forbidden
        assert_eq!(
            do_login(&state, "a@b.com", "longpassword1").await,
            Err(StatusCode::FORBIDDEN)
        );

        // confirm via the emailed token
        let token = confirmation_token(&mailer);
        let (status, body) = confirm_email(State(state.clone()), Path(token.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, CONFIRM_BODY);

        // idempotent
        let (status, _) = confirm_email(State(state.clone()), Path(token)).await;
        assert_eq!(status, StatusCode::OK);

        // login now yields a valid session token
        let token = do_login(&state, "a@b.com", "longpassword1").await.unwrap();
        assert!(state.tokens.validate_session(&token));
    }

    #[tokio::test]
    async fn register_duplicate_email_contract() {
        let (state, _mailer) = test_state();
        assert_eq!(do_register(&state, "dup@b.com", "longpassword1").await, StatusCode::CREATED);

        // unconfirmed duplicate resends the link
        assert_eq!(do_register(&state, "dup@b.com", "longpassword1").await, StatusCode::ACCEPTED);

        // case-insensitive duplicate detection
        assert_eq!(do_register(&state, "DUP@B.com", "longpassword1").await, StatusCode::ACCEPTED);

        // confirmed duplicate conflicts
        let mut user = state
            .repos
            .users()
            .find_by_email("dup@b.com")
            .await
            .unwrap()
            .unwrap();
        user.is_confirmed = true;
        state.repos.users().save(user).await.unwrap();
        assert_eq!(do_register(&state, "dup@b.com", "longpassword1").await, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_rejects_invalid_fields() {
        let (state, mailer) = test_state();
        assert_eq!(do_register(&state, "not-an-email", "longpassword1").await, StatusCode::BAD_REQUEST);
        assert_eq!(do_register(&state, "a@b.com", "short").await, StatusCode::BAD_REQUEST);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn login_status_contract() {
        let (state, mailer) = test_state();
        assert_eq!(do_register(&state, "c@d.com", "longpassword1").await, StatusCode::CREATED);
        let token = confirmation_token(&mailer);
        confirm_email(State(state.clone()), Path(token)).await;

        assert_eq!(
            do_login(&state, "ghost@d.com", "longpassword1").await,
            Err(StatusCode::NOT_FOUND)
        );
        assert_eq!(
            do_login(&state, "c@d.com", "wrongpassword").await,
            Err(StatusCode::UNAUTHORIZED)
        );
        assert!(do_login(&state, "c@d.com", "longpassword1").await.is_ok());
    }

    #[tokio::test]
    async fn registration_is_rate_limited() {
        let (mut state, _mailer) = test_state();
        state.rate_limiter = Arc::new(RateLimiter::new(60, 2));

        assert_eq!(do_register(&state, "not-an-email", "x").await, StatusCode::BAD_REQUEST);
        assert_eq!(do_register(&state, "not-an-email", "x").await, StatusCode::BAD_REQUEST);
        // third hit in the window is rejected before validation
        assert_eq!(do_register(&state, "not-an-email", "x").await, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn confirm_with_garbage_token_is_unauthorized() {
        let (state, _mailer) = test_state();
        let (status, _) = confirm_email(State(state), Path("garbage".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wishlist_add_remove_contract() {
        let (state, _mailer) = test_state();
        let mut user = User::new("wish@b.com", "Wi", "Sher", "cred");
        user.is_confirmed = true;
        state.repos.users().save(user.clone()).await.unwrap();
        let auth = AuthenticatedUser {
            user_id: user.id.clone(),
            admin_claim: false,
            token: state.tokens.issue_session(&user).unwrap(),
        };

        let product = crate::domain::Product::new(
            "Casa Azul",
            "Casa frente al mar",
            crate::domain::Address {
                country: "España".to_string(),
                city: "Valencia".to_string(),
                street: "Calle 1".to_string(),
            },
        );
        state.repos.products().save(product.clone()).await.unwrap();

        // unknown products cannot be wishlisted
        let result = wishlist_add(
            State(state.clone()),
            Extension(auth.clone()),
            Path("no-such-product".to_string()),
        )
        .await;
        assert_eq!(result.unwrap_err().0, StatusCode::NOT_FOUND);

        // add once, a second add conflicts
        wishlist_add(State(state.clone()), Extension(auth.clone()), Path(product.id.clone()))
            .await
            .unwrap();
        let result = wishlist_add(
            State(state.clone()),
            Extension(auth.clone()),
            Path(product.id.clone()),
        )
        .await;
        assert_eq!(result.unwrap_err().0, StatusCode::CONFLICT);

        let Json(resp) = get_wishlist(State(state.clone()), Extension(auth.clone()))
            .await
            .unwrap();
        assert_eq!(resp.data.unwrap(), vec![product.id.clone()]);

        // remove succeeds and stays 200 when the entry is already gone
        wishlist_remove(State(state.clone()), Extension(auth.clone()), Path(product.id.clone()))
            .await
            .unwrap();
        wishlist_remove(State(state.clone()), Extension(auth.clone()), Path(product.id))
            .await
            .unwrap();
        let Json(resp) = get_wishlist(State(state), Extension(auth)).await.unwrap();
        assert!(resp.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_users_requires_admin_role() {
        let (state, _mailer) = test_state();
        let mut admin = User::new("admin@b.com", "Ad", "Min", "cred");
        admin.is_admin = true;
        admin.is_confirmed = true;
        state.repos.users().save(admin.clone()).await.unwrap();
        let mut guest = User::new("guest@b.com", "Gu", "Est", "cred");
        guest.is_confirmed = true;
        state.repos.users().save(guest.clone()).await.unwrap();

        let guest_auth = AuthenticatedUser {
            user_id: guest.id.clone(),
            admin_claim: false,
            token: state.tokens.issue_session(&guest).unwrap(),
        };
        let result = list_users(State(state.clone()), Extension(guest_auth)).await;
        assert_eq!(result.unwrap_err().0, StatusCode::UNAUTHORIZED);

        let admin_auth = AuthenticatedUser {
            user_id: admin.id.clone(),
            admin_claim: true,
            token: state.tokens.issue_session(&admin).unwrap(),
        };
        let Json(resp) = list_users(State(state), Extension(admin_auth)).await.unwrap();
        assert_eq!(resp.data.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn name_is_private_without_confirmed_review() {
        let (state, _mailer) = test_state();
        let mut user = User::new("rev@b.com", "Ana", "García", "cred");
        user.is_confirmed = true;
        state.repos.users().save(user.clone()).await.unwrap();

        // confirmed but no review yet
        let result = get_name(State(state.clone()), Path(user.id.clone())).await;
        assert_eq!(result.unwrap_err().0, StatusCode::NOT_FOUND);

        state
            .repos
            .reviews()
            .save(crate::domain::Review::new(user.id.clone(), "p1", 5, "bien"))
            .await
            .unwrap();
        let Json(resp) = get_name(State(state), Path(user.id)).await.unwrap();
        assert_eq!(resp.data.unwrap(), "Ana García");
    }
}
