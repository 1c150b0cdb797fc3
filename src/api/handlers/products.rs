//! Product (listing) REST API handlers
//!
//! Reads are public; mutations require the admin role. Category
//! membership lives on the category aggregate, so create/update/delete
//! keep the owning category's product list in sync.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::api::dto::{ApiResponse, EmptyData};
use crate::api::handlers::{domain_error, require_admin, status_error, ApiError, AppState};
use crate::auth::AuthenticatedUser;
use crate::domain::{Address, Policy, Product};
use crate::notifications::{EntityIdsEvent, Event};

/// Listing address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressDto {
    pub country: String,
    pub city: String,
    pub street: String,
}

impl From<Address> for AddressDto {
    fn from(a: Address) -> Self {
        Self {
            country: a.country,
            city: a.city,
            street: a.street,
        }
    }
}

impl From<AddressDto> for Address {
    fn from(a: AddressDto) -> Self {
        Self {
            country: a.country,
            city: a.city,
            street: a.street,
        }
    }
}

/// House policy entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolicyDto {
    pub title: String,
    pub description: String,
}

impl From<Policy> for PolicyDto {
    fn from(p: Policy) -> Self {
        Self {
            title: p.title,
            description: p.description,
        }
    }
}

impl From<PolicyDto> for Policy {
    fn from(p: PolicyDto) -> Self {
        Self {
            title: p.title,
            description: p.description,
        }
    }
}

/// Full listing view
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub features: Vec<Vec<String>>,
    pub address: AddressDto,
    pub map_url: String,
    pub map_embed: String,
    pub policies: Vec<PolicyDto>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            images: p.images,
            features: p.features,
            address: p.address.into(),
            map_url: p.map_url,
            map_embed: p.map_embed,
            policies: p.policies.into_iter().map(Into::into).collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Listing creation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Owning category
    pub category_id: String,
    #[serde(default)]
    pub features: Vec<Vec<String>>,
    pub address: AddressDto,
    #[serde(default)]
    pub map_url: String,
    #[serde(default)]
    pub map_embed: String,
    #[serde(default)]
    pub policies: Vec<PolicyDto>,
}

/// Partial listing update
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    /// Move the listing to another category
    pub category_id: Option<String>,
    pub features: Option<Vec<Vec<String>>>,
    pub address: Option<AddressDto>,
    pub map_url: Option<String>,
    pub map_embed: Option<String>,
    pub policies: Option<Vec<PolicyDto>>,
}

/// Search filter
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchParams {
    pub country: String,
    pub city: String,
}

/// List all listings
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    responses(
        (status = 200, description = "All listings", body = ApiResponse<Vec<ProductDto>>)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductDto>>>, ApiError> {
    let products = state.repos.products().find_all().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        products.into_iter().map(Into::into).collect(),
    )))
}

/// Get a listing by ID
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "The listing", body = ApiResponse<ProductDto>),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    match state.repos.products().find_by_id(&id).await.map_err(domain_error)? {
        Some(p) => Ok(Json(ApiResponse::success(p.into()))),
        None => Err(status_error(StatusCode::NOT_FOUND, "Unknown product")),
    }
}

/// Search listings by country and city
#[utoipa::path(
    get,
    path = "/api/products/search",
    tag = "Products",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching listings", body = ApiResponse<Vec<ProductDto>>)
    )
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ProductDto>>>, ApiError> {
    let products = state
        .repos
        .products()
        .find_by_country_city(&params.country, &params.city)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        products.into_iter().map(Into::into).collect(),
    )))
}

/// Distinct addresses across all listings (for the search dropdowns)
#[utoipa::path(
    get,
    path = "/api/products/addresses",
    tag = "Products",
    responses(
        (status = 200, description = "Distinct addresses", body = ApiResponse<Vec<AddressDto>>)
    )
)]
pub async fn list_addresses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AddressDto>>>, ApiError> {
    let addresses = state
        .repos
        .products()
        .find_all_addresses()
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        addresses.into_iter().map(Into::into).collect(),
    )))
}

/// Create a listing (admin)
///
/// The new product is added to the requested category's member list.
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Listing created", body = ApiResponse<ProductDto>),
        (status = 401, description = "Caller is not an admin"),
        (status = 404, description = "Unknown category")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDto>>), ApiError> {
    require_admin(&state, &auth).await?;

    let Some(mut category) = state
        .repos
        .categories()
        .find_by_id(&req.category_id)
        .await
        .map_err(domain_error)?
    else {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown category"));
    };

    let mut product = Product::new(req.name, req.description, req.address.into());
    product.images = req.images;
    product.features = req.features;
    product.map_url = req.map_url;
    product.map_embed = req.map_embed;
    product.policies = req.policies.into_iter().map(Into::into).collect();

    state
        .repos
        .products()
        .save(product.clone())
        .await
        .map_err(domain_error)?;

    category.add_product(&product.id);
    category.updated_at = Utc::now();
    let category_id = category.id.clone();
    state
        .repos
        .categories()
        .save(category)
        .await
        .map_err(domain_error)?;
    info!("Product created: {} ({})", product.name, product.id);

    state
        .event_bus
        .publish(Event::UpdateProduct(EntityIdsEvent::one(product.id.clone())));
    state
        .event_bus
        .publish(Event::UpdateCategory(EntityIdsEvent::one(category_id)));

    Ok((StatusCode::CREATED, Json(ApiResponse::success(product.into()))))
}

/// Update a listing (admin, partial)
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Listing updated", body = ApiResponse<ProductDto>),
        (status = 401, description = "Caller is not an admin"),
        (status = 404, description = "Unknown product or category")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    require_admin(&state, &auth).await?;

    let Some(mut product) = state
        .repos
        .products()
        .find_by_id(&id)
        .await
        .map_err(domain_error)?
    else {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown product"));
    };

    if let Some(name) = req.name {
        product.name = name;
    }
    if let Some(description) = req.description {
        product.description = description;
    }
    if let Some(images) = req.images {
        product.images = images;
    }
    if let Some(features) = req.features {
        product.features = features;
    }
    if let Some(address) = req.address {
        product.address = address.into();
    }
    if let Some(map_url) = req.map_url {
        product.map_url = map_url;
    }
    if let Some(map_embed) = req.map_embed {
        product.map_embed = map_embed;
    }
    if let Some(policies) = req.policies {
        product.policies = policies.into_iter().map(Into::into).collect();
    }
    product.updated_at = Utc::now();

    // optional category move: remove from the old owner, add to the new
    let mut touched_categories: Vec<String> = Vec::new();
    if let Some(new_category_id) = req.category_id {
        let Some(mut target) = state
            .repos
            .categories()
            .find_by_id(&new_category_id)
            .await
            .map_err(domain_error)?
        else {
            return Err(status_error(StatusCode::NOT_FOUND, "Unknown category"));
        };

        if let Some(mut current) = state
            .repos
            .categories()
            .find_by_product(&product.id)
            .await
            .map_err(domain_error)?
        {
            if current.id != target.id {
                current.remove_product(&product.id);
                current.updated_at = Utc::now();
                touched_categories.push(current.id.clone());
                state
                    .repos
                    .categories()
                    .save(current)
                    .await
                    .map_err(domain_error)?;
            }
        }

        if !target.contains_product(&product.id) {
            target.add_product(&product.id);
            target.updated_at = Utc::now();
            touched_categories.push(target.id.clone());
            state
                .repos
                .categories()
                .save(target)
                .await
                .map_err(domain_error)?;
        }
    }

    state
        .repos
        .products()
        .save(product.clone())
        .await
        .map_err(domain_error)?;

    state
        .event_bus
        .publish(Event::UpdateProduct(EntityIdsEvent::one(product.id.clone())));
    if !touched_categories.is_empty() {
        state.event_bus.publish(Event::UpdateCategory(EntityIdsEvent {
            ids: touched_categories,
        }));
    }

    Ok(Json(ApiResponse::success(product.into())))
}

/// Delete a listing (admin)
///
/// Also drops the product from its owning category's member list.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Listing deleted"),
        (status = 401, description = "Caller is not an admin"),
        (status = 404, description = "Unknown product")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    require_admin(&state, &auth).await?;

    if state
        .repos
        .products()
        .find_by_id(&id)
        .await
        .map_err(domain_error)?
        .is_none()
    {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown product"));
    }

    let owning_category = state
        .repos
        .categories()
        .find_by_product(&id)
        .await
        .map_err(domain_error)?;
    if let Some(mut category) = owning_category {
        category.remove_product(&id);
        category.updated_at = Utc::now();
        let category_id = category.id.clone();
        state
            .repos
            .categories()
            .save(category)
            .await
            .map_err(domain_error)?;
        state
            .event_bus
            .publish(Event::UpdateCategory(EntityIdsEvent::one(category_id)));
    }

    state.repos.products().delete(&id).await.map_err(domain_error)?;
    info!("Product deleted: {}", id);

    state
        .event_bus
        .publish(Event::UpdateProduct(EntityIdsEvent::one(id)));
    Ok(Json(ApiResponse::success(EmptyData {})))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{AuthGateway, JwtConfig, RateLimiter, TokenService};
    use crate::domain::{Category, RepositoryProvider, User};
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

        let mut admin = User::new("admin@b.com", "Ad", "Min", "cred");
        admin.is_admin = true;
        admin.is_confirmed = true;
        repos.users().save(admin.clone()).await.unwrap();
        let token = tokens.issue_session(&admin).unwrap();
        let auth = AuthenticatedUser {
            user_id: admin.id,
            admin_claim: true,
            token,
        };

        let category = Category::new("Hoteles", "Hoteles y resorts");
        repos.categories().save(category.clone()).await.unwrap();

        let state = AppState {
            repos: Arc::clone(&repos),
            gateway: Arc::new(AuthGateway::new(tokens.clone(), Arc::clone(&repos))),
            tokens,
            rate_limiter: Arc::new(RateLimiter::new(60, 1000)),
            mailer: Arc::new(CapturingMailer::new()),
            event_bus: create_event_bus(),
            public_url: "http://localhost:8080".to_string(),
        };
        (state, auth, category.id)
    }

    fn create_request(category_id: &str) -> CreateProductRequest {
        CreateProductRequest {
            name: "Casa Azul".to_string(),
            description: "Casa frente al mar".to_string(),
            images: vec![],
            category_id: category_id.to_string(),
            features: vec![],
            address: AddressDto {
                country: "España".to_string(),
                city: "Valencia".to_string(),
                street: "Calle 1".to_string(),
            },
            map_url: String::new(),
            map_embed: String::new(),
            policies: vec![],
        }
    }

    #[tokio::test]
    async fn create_adds_product_to_category() {
        let (state, auth, category_id) = test_state().await;

        let (status, Json(resp)) = create_product(
            State(state.clone()),
            Extension(auth),
            Json(create_request(&category_id)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let product_id = resp.data.unwrap().id;

        let category = state
            .repos
            .categories()
            .find_by_id(&category_id)
            .await
            .unwrap()
            .unwrap();
        assert!(category.contains_product(&product_id));
    }

    #[tokio::test]
    async fn create_requires_admin_and_known_category() {
        let (state, auth, category_id) = test_state().await;

        let result = create_product(
            State(state.clone()),
            Extension(auth.clone()),
            Json(create_request("no-such-category")),
        )
        .await;
        assert_eq!(result.unwrap_err().0, StatusCode::NOT_FOUND);

        // a non-admin caller is refused even with a valid token
        let mut guest = User::new("guest@b.com", "Gu", "Est", "cred");
        guest.is_confirmed = true;
        state.repos.users().save(guest.clone()).await.unwrap();
        let guest_auth = AuthenticatedUser {
            user_id: guest.id.clone(),
            admin_claim: false,
            token: state.tokens.issue_session(&guest).unwrap(),
        };
        let result = create_product(
            State(state),
            Extension(guest_auth),
            Json(create_request(&category_id)),
        )
        .await;
        assert_eq!(result.unwrap_err().0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_moves_product_between_categories() {
        let (state, auth, category_id) = test_state().await;
        let (_, Json(resp)) = create_product(
            State(state.clone()),
            Extension(auth.clone()),
            Json(create_request(&category_id)),
        )
        .await
        .unwrap();
        let product_id = resp.data.unwrap().id;

        let other = Category::new("Apartamentos", "Pisos y estudios");
        state.repos.categories().save(other.clone()).await.unwrap();

        update_product(
            State(state.clone()),
            Extension(auth),
            Path(product_id.clone()),
            Json(UpdateProductRequest {
                name: None,
                description: None,
                images: None,
                category_id: Some(other.id.clone()),
                features: None,
                address: None,
                map_url: None,
                map_embed: None,
                policies: None,
            }),
        )
        .await
        .unwrap();

        let old = state
            .repos
            .categories()
            .find_by_id(&category_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!old.contains_product(&product_id));
        let new = state
            .repos
            .categories()
            .find_by_id(&other.id)
            .await
            .unwrap()
            .unwrap();
        assert!(new.contains_product(&product_id));
    }

    #[tokio::test]
    async fn delete_drops_product_from_owning_category() {
        let (state, auth, category_id) = test_state().await;
        let (_, Json(resp)) = create_product(
            State(state.clone()),
            Extension(auth.clone()),
            Json(create_request(&category_id)),
        )
        .await
        .unwrap();
        let product_id = resp.data.unwrap().id;

        delete_product(State(state.clone()), Extension(auth), Path(product_id.clone()))
            .await
            .unwrap();

        assert!(state
            .repos
            .products()
            .find_by_id(&product_id)
            .await
            .unwrap()
            .is_none());
        let category = state
            .repos
            .categories()
            .find_by_id(&category_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!category.contains_product(&product_id));
    }
}
