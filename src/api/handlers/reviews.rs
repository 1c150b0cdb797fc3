//! Review REST API handlers
//!
//! One review per user per product, rating 1 to 5. Product review lists
//! are public.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::api::dto::ApiResponse;
use crate::api::handlers::{domain_error, status_error, ApiError, AppState};
use crate::auth::AuthenticatedUser;
use crate::domain::Review;
use crate::notifications::{EntityIdsEvent, Event};

/// Review view. Carries the reviewer's ID only, never their email;
/// display names go through the user name endpoint and its privacy rule.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewDto {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Review> for ReviewDto {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

/// Review creation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub product_id: String,
    /// Star rating, 1 to 5
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

/// Post a review
#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "Reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review posted", body = ApiResponse<ReviewDto>),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Unknown product"),
        (status = 409, description = "Already reviewed this product")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewDto>>), ApiError> {
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

    if !(1..=5).contains(&req.rating) {
        return Err(status_error(StatusCode::BAD_REQUEST, "Rating must be 1 to 5"));
    }

    if state
        .repos
        .reviews()
        .find_by_user_and_product(&auth.user_id, &req.product_id)
        .await
        .map_err(domain_error)?
        .is_some()
    {
        return Err(status_error(
            StatusCode::CONFLICT,
            "Product already reviewed by this user",
        ));
    }

    let review = Review::new(auth.user_id, req.product_id, req.rating, req.comment);
    state
        .repos
        .reviews()
        .save(review.clone())
        .await
        .map_err(domain_error)?;
    info!("Review posted: {} for product {}", review.id, review.product_id);

    state
        .event_bus
        .publish(Event::UpdateReviews(EntityIdsEvent::one(review.product_id.clone())));
    Ok((StatusCode::CREATED, Json(ApiResponse::success(review.into()))))
}

/// Reviews of a product (public)
#[utoipa::path(
    get,
    path = "/api/reviews/product/{id}",
    tag = "Reviews",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Reviews of the product", body = ApiResponse<Vec<ReviewDto>>)
    )
)]
pub async fn list_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ReviewDto>>>, ApiError> {
    let reviews = state
        .repos
        .reviews()
        .find_by_product(&product_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        reviews.into_iter().map(Into::into).collect(),
    )))
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

        let mut user = User::new("rev@b.com", "Re", "Viewer", "cred");
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

    async fn post_review(
        state: &AppState,
        auth: &AuthenticatedUser,
        product_id: &str,
        rating: i32,
    ) -> StatusCode {
        match create_review(
            State(state.clone()),
            Extension(auth.clone()),
            Json(CreateReviewRequest {
                product_id: product_id.to_string(),
                rating,
                comment: "bien".to_string(),
            }),
        )
        .await
        {
            Ok((status, _)) => status,
            Err((status, _)) => status,
        }
    }

    #[tokio::test]
    async fn one_review_per_user_per_product() {
        let (state, auth, product_id) = test_state().await;
        assert_eq!(post_review(&state, &auth, &product_id, 5).await, StatusCode::CREATED);
        assert_eq!(post_review(&state, &auth, &product_id, 3).await, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn rating_bounds_enforced() {
        let (state, auth, product_id) = test_state().await;
        assert_eq!(post_review(&state, &auth, &product_id, 0).await, StatusCode::BAD_REQUEST);
        assert_eq!(post_review(&state, &auth, &product_id, 6).await, StatusCode::BAD_REQUEST);
        assert_eq!(post_review(&state, &auth, "nope", 4).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn product_reviews_are_public_and_listed() {
        let (state, auth, product_id) = test_state().await;
        post_review(&state, &auth, &product_id, 4).await;

        let Json(resp) = list_product_reviews(State(state), Path(product_id))
            .await
            .unwrap();
        let reviews = resp.data.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, 4);
    }
}
