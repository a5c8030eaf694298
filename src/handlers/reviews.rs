use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::services::reviews::CreateReviewRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

/// List a product's reviews, newest first
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Reviews retrieved"),
        (status = 404, description = "Product not found"),
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let reviews = state.services.reviews.list_reviews(product_id).await?;
    Ok(Json(ApiResponse::success(reviews)))
}

/// Review a product
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 201, description = "Review created"),
        (status = 400, description = "Rating out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Product not found"),
    ),
    security(("Bearer" = [])),
    tag = "reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .reviews
        .create_review(product_id, auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(review))))
}
