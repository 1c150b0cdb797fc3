//! Category REST API handlers
//!
//! Reads are public; mutations require the admin role. Category names
//! are unique.

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
use crate::api::handlers::{domain_error, require_admin, status_error, ApiError, AppState};
use crate::auth::AuthenticatedUser;
use crate::domain::Category;
use crate::notifications::{EntityIdsEvent, Event};

/// Category view including member product IDs
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub products: Vec<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            image: c.image,
            products: c.products,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Category creation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// Partial category update
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// List all categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categories",
    responses(
        (status = 200, description = "All categories", body = ApiResponse<Vec<CategoryDto>>)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let categories = state
        .repos
        .categories()
        .find_all()
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        categories.into_iter().map(Into::into).collect(),
    )))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "The category", body = ApiResponse<CategoryDto>),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    match state
        .repos
        .categories()
        .find_by_id(&id)
        .await
        .map_err(domain_error)?
    {
        Some(c) => Ok(Json(ApiResponse::success(c.into()))),
        None => Err(status_error(StatusCode::NOT_FOUND, "Unknown category")),
    }
}

/// Create a category (admin, name must be unique)
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryDto>),
        (status = 401, description = "Caller is not an admin"),
        (status = 409, description = "Name already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryDto>>), ApiError> {
    require_admin(&state, &auth).await?;

    if state
        .repos
        .categories()
        .find_by_name(&req.name)
        .await
        .map_err(domain_error)?
        .is_some()
    {
        return Err(status_error(StatusCode::CONFLICT, "Category name already taken"));
    }

    let mut category = Category::new(req.name, req.description);
    category.image = req.image;
    state
        .repos
        .categories()
        .save(category.clone())
        .await
        .map_err(domain_error)?;
    info!("Category created: {} ({})", category.name, category.id);

    state
        .event_bus
        .publish(Event::UpdateCategory(EntityIdsEvent::one(category.id.clone())));
    Ok((StatusCode::CREATED, Json(ApiResponse::success(category.into()))))
}

/// Update a category (admin, partial)
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryDto>),
        (status = 401, description = "Caller is not an admin"),
        (status = 404, description = "Unknown category"),
        (status = 409, description = "New name already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    require_admin(&state, &auth).await?;

    let Some(mut category) = state
        .repos
        .categories()
        .find_by_id(&id)
        .await
        .map_err(domain_error)?
    else {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown category"));
    };

    if let Some(name) = req.name {
        if name != category.name {
            if state
                .repos
                .categories()
                .find_by_name(&name)
                .await
                .map_err(domain_error)?
                .is_some()
            {
                return Err(status_error(StatusCode::CONFLICT, "Category name already taken"));
            }
            category.name = name;
        }
    }
    if let Some(description) = req.description {
        category.description = description;
    }
    if let Some(image) = req.image {
        category.image = image;
    }
    category.updated_at = Utc::now();

    state
        .repos
        .categories()
        .save(category.clone())
        .await
        .map_err(domain_error)?;

    state
        .event_bus
        .publish(Event::UpdateCategory(EntityIdsEvent::one(category.id.clone())));
    Ok(Json(ApiResponse::success(category.into())))
}

/// Delete a category (admin)
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 401, description = "Caller is not an admin"),
        (status = 404, description = "Unknown category")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    require_admin(&state, &auth).await?;

    if state
        .repos
        .categories()
        .find_by_id(&id)
        .await
        .map_err(domain_error)?
        .is_none()
    {
        return Err(status_error(StatusCode::NOT_FOUND, "Unknown category"));
    }

    state
        .repos
        .categories()
        .delete(&id)
        .await
        .map_err(domain_error)?;
    info!("Category deleted: {}", id);

    state
        .event_bus
        .publish(Event::UpdateCategory(EntityIdsEvent::one(id)));
    Ok(Json(ApiResponse::success(EmptyData {})))
}
