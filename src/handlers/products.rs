use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::services::catalog::{CreateProductRequest, ProductListQuery, UpdateProductRequest};
use crate::{errors::ServiceError, ApiResponse, AppState};

/// List active products with filtering and pagination
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(
        ("category" = Option<String>, Query, description = "Category slug filter"),
        ("sort" = Option<String>, Query, description = "newest | price-low | price-high"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Products retrieved"),
        (status = 404, description = "Unknown category slug"),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.catalog.list_products(query).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Get a single product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product retrieved"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Create a product (admin)
#[utoipa::path(
    post,
    path = "/api/v1/products",
    responses(
        (status = 201, description = "Product created"),
        (status = 403, description = "Admin access required"),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let product = state.services.catalog.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// Update a product (admin)
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product updated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found"),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn update_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let product = state.services.catalog.update_product(id, request).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Deactivate a product (admin)
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found"),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    state.services.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
