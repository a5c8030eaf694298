use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::auth::AuthUser;
use crate::services::orders::CreateOrderRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

/// Place an order
///
/// Items are priced from the live catalog; the request carries only product
/// ids and quantities. Payment happens afterwards via the payments routes.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Invalid input or insufficient stock"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .create_order(auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// The caller's orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders/mine",
    responses(
        (status = 200, description = "Orders retrieved"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.my_orders(auth_user.user_id).await?;
    Ok(Json(ApiResponse::success(orders)))
}
