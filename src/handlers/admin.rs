//! Back-office handlers. Every handler here starts with an explicit
//! `require_admin` check; there is no routing-layer role interception.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::services::accounts::AssignRoleRequest;
use crate::services::coupons::CreateCouponRequest;
use crate::services::orders::UpdateOrderStatusRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// List all orders with customer identity (admin)
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Orders retrieved"),
        (status = 403, description = "Admin access required"),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let result = state.services.orders.list_orders(page, per_page).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Update an order's fulfillment status (admin)
#[utoipa::path(
    put,
    path = "/api/v1/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Order not found"),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let order = state.services.orders.update_status(id, request).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// List customer accounts (admin)
#[utoipa::path(
    get,
    path = "/api/v1/admin/customers",
    responses(
        (status = 200, description = "Customers retrieved"),
        (status = 403, description = "Admin access required"),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let customers = state.services.accounts.list_customers().await?;
    Ok(Json(ApiResponse::success(customers)))
}

/// Assign a role to a customer (admin)
#[utoipa::path(
    put,
    path = "/api/v1/admin/customers/{id}/role",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Role assigned"),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found"),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn assign_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignRoleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let user = state.services.accounts.assign_role(id, request).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// List coupons (admin)
#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons",
    responses(
        (status = 200, description = "Coupons retrieved"),
        (status = 403, description = "Admin access required"),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let coupons = state.services.coupons.list_coupons().await?;
    Ok(Json(ApiResponse::success(coupons)))
}

/// Create a coupon (admin)
#[utoipa::path(
    post,
    path = "/api/v1/admin/coupons",
    responses(
        (status = 201, description = "Coupon created"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Code already exists"),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateCouponRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let coupon = state.services.coupons.create_coupon(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(coupon))))
}

/// Deactivate a coupon (admin)
#[utoipa::path(
    delete,
    path = "/api/v1/admin/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon id")),
    responses(
        (status = 200, description = "Coupon deactivated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Coupon not found"),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn deactivate_coupon(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_user.require_admin()?;
    let coupon = state.services.coupons.deactivate_coupon(id).await?;
    Ok(Json(ApiResponse::success(coupon)))
}
