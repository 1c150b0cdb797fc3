//! API Router with Swagger UI

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::dto::{ApiResponse, EmptyData};
use crate::api::handlers::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use crate::api::handlers::{categories, health, products, reservations, reviews, users, AppState};
use crate::auth::{auth_middleware, AuthState};
use crate::notifications::{create_notification_state, ws_notifications_handler};

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        AuthState {
            tokens: s.tokens.clone(),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Users
        users::list_users,
        users::validate,
        users::renovate,
        users::get_wishlist,
        users::wishlist_add,
        users::wishlist_remove,
        users::register,
        users::login,
        users::confirm_email,
        users::update_name,
        users::update_password,
        users::set_admin,
        users::my_reservations,
        users::my_reviews,
        users::get_name,
        // Products
        products::list_products,
        products::get_product,
        products::search_products,
        products::list_addresses,
        products::create_product,
        products::update_product,
        products::delete_product,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Reservations
        reservations::create_reservation,
        reservations::list_my_reservations,
        reservations::cancel_reservation,
        // Reviews
        reviews::create_review,
        reviews::list_product_reviews,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            EmptyData,
            health::HealthResponse,
            // Users
            users::UserDto,
            users::RegisterRequest,
            users::LoginRequest,
            users::TokenResponse,
            users::UpdateNameRequest,
            users::UpdatePasswordRequest,
            users::SetAdminRequest,
            // Products
            products::ProductDto,
            products::AddressDto,
            products::PolicyDto,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            // Categories
            categories::CategoryDto,
            categories::CreateCategoryRequest,
            categories::UpdateCategoryRequest,
            // Reservations
            reservations::ReservationDto,
            reservations::CreateReservationRequest,
            // Reviews
            reviews::ReviewDto,
            reviews::CreateReviewRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probe for uptime monitoring."),
        (name = "Users", description = "Account lifecycle: registration with email confirmation, login (JWT), token validation and renovation, wishlist, profile updates, admin-flag management. The session token goes in `Authorization: Bearer <token>`. A 202 from `/validate` means the token's role claim is stale and the client should call `/renovate`."),
        (name = "Products", description = "Property listings. Reads are public; create/update/delete require the admin role. Category membership is maintained automatically."),
        (name = "Categories", description = "Listing categories with unique names. Reads are public; mutations require the admin role."),
        (name = "Reservations", description = "Bookings of listings. Time ranges are epoch milliseconds, half-open (`start` inclusive, `end` exclusive); overlapping bookings of the same listing conflict."),
        (name = "Reviews", description = "Star ratings (1-5) with comments, one per user per listing. Product review lists are public."),
        (name = "WebSocket Notifications", description = "Real-time change events at `ws://host:port/api/notifications/ws`. Optional query filters: `id` (affected entity) and `event_types` (comma-separated). Events: `updateWishlist`, `updateUser`, `updateProduct`, `updateCategory`, `updateReservations`, `updateReviews`."),
    ),
    info(
        title = "SmartStay Booking API",
        version = "1.0.0",
        description = "REST API of the SmartStay property booking backend.

## Authentication

Obtain a session token via `POST /api/users/login` and pass it in the
`Authorization: Bearer <token>` header. New accounts must confirm their
email through the link sent on registration before logging in.

## Real-time notifications

Connect to `ws://host:port/api/notifications/ws` for change events.
Supported query parameters:
- `id` — only events affecting this entity
- `event_types` — comma-separated event type filter

## Response format

REST responses use a standard envelope:
```json
{\"success\": true, \"data\": {...}}
```

On error:
```json
{\"success\": false, \"data\": null, \"error\": \"description\"}
```

The email confirmation endpoint answers with a plain-text body instead,
since it is opened in the browser.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = AuthState {
        tokens: state.tokens.clone(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // User routes (public)
    let user_public_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/confirm/{token}", get(users::confirm_email))
        .route("/name/{id}", get(users::get_name))
        .with_state(state.clone());

    // User routes (protected)
    let user_protected_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/validate", get(users::validate))
        .route("/renovate", get(users::renovate))
        .route("/wishlist", get(users::get_wishlist))
        .route("/wishlist/add/{id}", post(users::wishlist_add))
        .route("/wishlist/remove/{id}", delete(users::wishlist_remove))
        .route("/update/name", post(users::update_name))
        .route("/update/password", post(users::update_password))
        .route("/update/set-admin", post(users::set_admin))
        .route("/reservations", get(users::my_reservations))
        .route("/reviews", get(users::my_reviews))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    // Product routes: public reads, admin mutations
    let product_public_routes = Router::new()
        .route("/", get(products::list_products))
        .route("/search", get(products::search_products))
        .route("/addresses", get(products::list_addresses))
        .route("/{id}", get(products::get_product))
        .with_state(state.clone());

    let product_protected_routes = Router::new()
        .route("/", post(products::create_product))
        .route(
            "/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    // Category routes: public reads, admin mutations
    let category_public_routes = Router::new()
        .route("/", get(categories::list_categories))
        .route("/{id}", get(categories::get_category))
        .with_state(state.clone());

    let category_protected_routes = Router::new()
        .route("/", post(categories::create_category))
        .route(
            "/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    // Reservation routes (all protected)
    let reservation_routes = Router::new()
        .route(
            "/",
            get(reservations::list_my_reservations).post(reservations::create_reservation),
        )
        .route("/{id}", delete(reservations::cancel_reservation))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    // Review routes
    let review_public_routes = Router::new()
        .route("/product/{id}", get(reviews::list_product_reviews))
        .with_state(state.clone());

    let review_protected_routes = Router::new()
        .route("/", post(reviews::create_review))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(state.clone());

    // Notification WebSocket routes (no auth for WebSocket upgrade)
    let notification_state = create_notification_state(state.event_bus.clone());
    let notification_routes = Router::new()
        .route("/ws", get(ws_notifications_handler))
        .with_state(notification_state);

    let metrics_state = MetricsState {
        handle: metrics_handle,
    };

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health + metrics
        .route("/health", get(health::health_check))
        .route(
            "/metrics",
            get(prometheus_metrics).with_state(metrics_state),
        )
        // Users
        .nest("/api/users", user_public_routes)
        .nest("/api/users", user_protected_routes)
        // Products
        .nest("/api/products", product_public_routes)
        .nest("/api/products", product_protected_routes)
        // Categories
        .nest("/api/categories", category_public_routes)
        .nest("/api/categories", category_protected_routes)
        // Reservations
        .nest("/api/reservations", reservation_routes)
        // Reviews
        .nest("/api/reviews", review_public_routes)
        .nest("/api/reviews", review_protected_routes)
        // Notifications WebSocket
        .nest("/api/notifications", notification_routes)
        // Middleware
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::Service;

    use super::*;
    use crate::auth::{AuthGateway, JwtConfig, RateLimiter, TokenService};
    use crate::domain::{Address, Product, RepositoryProvider, User};
    use crate::infrastructure::email::testing::CapturingMailer;
    use crate::infrastructure::storage::MemoryRepositoryProvider;
    use crate::notifications::create_event_bus;

    async fn test_router() -> (Router, String, String) {
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
        // handle only, no global recorder install: tests run in parallel
        let handle = PrometheusBuilder::new().build_recorder().handle();
        (create_api_router(state, handle), token, product.id)
    }

    async fn send(router: Router, req: Request<Body>) -> axum::http::Response<Body> {
        let mut svc = router.into_service();
        svc.call(req).await.unwrap()
    }

    fn review_request(token: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/reviews")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let (router, _token, _) = test_router().await;
        let req = Request::builder()
            .uri("/api/users/validate")
            .body(Body::empty())
            .unwrap();
        let resp = send(router, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_unauthorized() {
        let (router, _token, _) = test_router().await;
        let req = Request::builder()
            .uri("/api/users/validate")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let resp = send(router, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_json_body_is_bad_request() {
        let (router, token, _) = test_router().await;
        let resp = send(router, review_request(&token, "{not json")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mistyped_json_body_is_unprocessable() {
        let (router, token, _) = test_router().await;
        // well-formed JSON missing the required fields
        let resp = send(router, review_request(&token, "{}")).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn valid_token_and_body_reach_the_handler() {
        let (router, token, product_id) = test_router().await;
        let body = serde_json::json!({"product_id": product_id, "rating": 5, "comment": "bien"});
        let resp = send(
            router,
            review_request(&token, serde_json::to_vec(&body).unwrap()),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}
