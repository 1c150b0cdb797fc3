//! Reservation REST API handlers
//!
//! All routes require authentication. A reservation needs an existing
//! product, a valid future time range and no overlap with another
//! booking of the same product.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::api::dto::{ApiResponse, EmptyData};
use crate::api::handlers::{domain_error, status_error, ApiError, AppState};
use crate::auth::AuthenticatedUser;
use crate::domain::Reservation;
use crate::notifications::{EntityIdsEvent, Event};

/// Booking view
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDto {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    /// Check-in, epoch millis
    pub start: i64,
    /// Check-out, epoch millis
    pub end: i64,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            start: r.start,
            end: r.end,
            created_at: r.created_at,
        }
    }
}

/// Booking request, times in epoch millis
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    pub product_id: String,
    pub start: i64,
    pub end: i64,
}

/// Book a product for a time range
#[utoipa::path(
    post,
    path = "/api/reservations",
    tag = "Reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Invalid time range"),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Unknown product"),
        (status = 409, description = "Overlaps an existing reservation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReservationDto>>), ApiError> {
    if state
        .repos
        .products()
        .find_by_id(&req.product_id)
        .await
        .map_err(domain_error)?
        .is_none()
    {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown product"));
    }

    let now_millis = Utc::now().timestamp_millis();
    if req.start >= req.end || req.start < now_millis {
        return Err(status_error(StatusCode::BAD_REQUEST, "Invalid time range"));
    }

    let existing = state
        .repos
        .reservations()
        .find_by_product(&req.product_id)
        .await
        .map_err(domain_error)?;
    if existing.iter().any(|r| r.overlaps(req.start, req.end)) {
        return Err(status_error(
            StatusCode::CONFLICT,
            "Overlaps an existing reservation",
        ));
    }

    let reservation = Reservation::new(auth.user_id, req.product_id, req.start, req.end);
    state
        .repos
        .reservations()
        .save(reservation.clone())
        .await
        .map_err(domain_error)?;
    info!(
        "Reservation created: {} for product {}",
        reservation.id, reservation.product_id
    );

    state.event_bus.publish(Event::UpdateReservations(EntityIdsEvent::one(
        reservation.product_id.clone(),
    )));
    Ok((StatusCode::CREATED, Json(ApiResponse::success(reservation.into()))))
}

/// The caller's reservations
#[utoipa::path(
    get,
    path = "/api/reservations",
    tag = "Reservations",
    responses(
        (status = 200, description = "Caller's reservations", body = ApiResponse<Vec<ReservationDto>>),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_reservations(
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

/// Cancel a reservation (owner or admin)
#[utoipa::path(
    delete,
    path = "/api/reservations/{id}",
    tag = "Reservations",
    params(("id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not the owner and not an admin"),
        (status = 404, description = "Unknown reservation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    let Some(reservation) = state
        .repos
        .reservations()
        .find_by_id(&id)
        .await
        .map_err(domain_error)?
    else {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown reservation"));
    };

    if reservation.user_id != auth.user_id
        && !state
            .gateway
            .is_currently_admin(&auth.token)
            .await
            .map_err(domain_error)?
    {
        return Err(status_error(StatusCode::FORBIDDEN, "Not your reservation"));
    }

    state
        .repos
        .reservations()
        .delete(&id)
        .await
        .map_err(domain_error)?;
    info!("Reservation cancelled: {}", id);

    state.event_bus.publish(Event::UpdateReservations(EntityIdsEvent::one(
        reservation.product_id,
    )));
    Ok(Json(ApiResponse::success(EmptyData {})))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{AuthGateway, JwtConfig, RateLimiter, TokenService};
    use crate::domain::{Address, Product, RepositoryProvider, User};
    use crate::infrastructure::email::testing::CapturingMailer;
    use crate::infrastructure::storage::MemoryRepositoryProvider;
    use crate::notifications::create_event_bus;

    async fn test_state() -> (AppState, AuthenticatedUser, String) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(MemoryRepositoryProvider::new());
        let tokens = TokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            session_ttl_hours: 1,
            confirmation_ttl_hours: 1,
            issuer: "smartstay-test".to_string(),
        });

        let mut user = User::new("guest@b.com", "Gu", "Est", "cred");
        user.is_confirmed = true;
        repos.users().save(user.clone()).await.unwrap();
        let token = tokens.issue_session(&user).unwrap();
        let auth = AuthenticatedUser {
            user_id: user.id,
            admin_claim: false,
            token,
        };

        let product = Product::new(
            "Casa Azul",
            "Casa frente al mar",
            Address {
                country: "España".to_string(),
                city: "Valencia".to_string(),
                street: "Calle 1".to_string(),
            },
        );
        repos.products().save(product.clone()).await.unwrap();

        let state = AppState {
            repos: Arc::clone(&repos),
            gateway: Arc::new(AuthGateway::new(tokens.clone(), Arc::clone(&repos))),
            tokens,
            rate_limiter: Arc::new(RateLimiter::new(60, 1000)),
            mailer: Arc::new(CapturingMailer::new()),
            event_bus: create_event_bus(),
            public_url: "http://localhost:8080".to_string(),
        };
        (state, auth, product.id)
    }

    async fn book(
        state: &AppState,
        auth: &AuthenticatedUser,
        product_id: &str,
        start: i64,
        end: i64,
    ) -> StatusCode {
        match create_reservation(
            State(state.clone()),
            Extension(auth.clone()),
            Json(CreateReservationRequest {
                product_id: product_id.to_string(),
                start,
                end,
            }),
        )
        .await
        {
            Ok((status, _)) => status,
            Err((status, _)) => status,
        }
    }

    #[tokio::test]
    async fn overlapping_reservation_conflicts() {
        let (state, auth, product_id) = test_state().await;
        let base = Utc::now().timestamp_millis() + 86_400_000;

        assert_eq!(
            book(&state, &auth, &product_id, base, base + 1000).await,
            StatusCode::CREATED
        );
        assert_eq!(
            book(&state, &auth, &product_id, base + 500, base + 2000).await,
            StatusCode::CONFLICT
        );
        // touching ranges are fine
        assert_eq!(
            book(&state, &auth, &product_id, base + 1000, base + 2000).await,
            StatusCode::CREATED
        );
    }

    #[tokio::test]
    async fn rejects_invalid_ranges_and_unknown_product() {
        let (state, auth, product_id) = test_state().await;
        let base = Utc::now().timestamp_millis() + 86_400_000;

        // start in the past
        assert_eq!(
            book(&state, &auth, &product_id, 1000, base).await,
            StatusCode::BAD_REQUEST
        );
        // end before start
        assert_eq!(
            book(&state, &auth, &product_id, base + 1000, base).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            book(&state, &auth, "no-such-product", base, base + 1000).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn cancel_is_owner_or_admin_only() {
        let (state, auth, product_id) = test_state().await;
        let base = Utc::now().timestamp_millis() + 86_400_000;
        book(&state, &auth, &product_id, base, base + 1000).await;
        let reservation = state
            .repos
            .reservations()
            .find_by_user(&auth.user_id)
            .await
            .unwrap()
            .remove(0);

        // another non-admin user may not cancel
        let mut stranger = User::new("other@b.com", "Ot", "Her", "cred");
        stranger.is_confirmed = true;
        state.repos.users().save(stranger.clone()).await.unwrap();
        let stranger_auth = AuthenticatedUser {
            user_id: stranger.id.clone(),
            admin_claim: false,
            token: state.tokens.issue_session(&stranger).unwrap(),
        };
        let result = cancel_reservation(
            State(state.clone()),
            Extension(stranger_auth),
            Path(reservation.id.clone()),
        )
        .await;
        assert_eq!(result.unwrap_err().0, StatusCode::FORBIDDEN);

        // the owner may
        cancel_reservation(State(state.clone()), Extension(auth.clone()), Path(reservation.id))
            .await
            .unwrap();
        assert!(state
            .repos
            .reservations()
            .find_by_user(&auth.user_id)
            .await
            .unwrap()
            .is_empty());
    }
}
