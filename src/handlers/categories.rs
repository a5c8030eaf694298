use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::auth::AuthUser;
use crate::services::catalog::CreateCategoryRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

/// List categories with product counts
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses((status = 200, description = "Categories retrieved")),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// Create a category (admin)
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    responses(
        (status = 201, description = "Category created"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Slug already exists"),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let category = state.services.catalog.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(category))))
}
