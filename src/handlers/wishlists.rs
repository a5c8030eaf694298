use axum::{extract::State, response::IntoResponse, Json};

use crate::auth::AuthUser;
use crate::services::wishlists::ToggleWishlistRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

/// The caller's wishlist
#[utoipa::path(
    get,
    path = "/api/v1/wishlist",
    responses(
        (status = 200, description = "Wishlist retrieved"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state
        .services
        .wishlists
        .get_wishlist(auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(products)))
}

/// Toggle a product's wishlist membership
#[utoipa::path(
    post,
    path = "/api/v1/wishlist",
    responses(
        (status = 200, description = "Toggled; response names the action taken"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Product not found"),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn toggle_wishlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<ToggleWishlistRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state
        .services
        .wishlists
        .toggle(auth_user.user_id, request)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}
