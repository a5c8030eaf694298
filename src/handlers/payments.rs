use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::{errors::ServiceError, ApiResponse, AppState};

/// Body for payment initialization. `email` is the contact address handed
/// to the gateway; when absent, the token's email is used.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentRequest {
    pub order_id: Uuid,
    pub email: Option<String>,
}

/// Initialize payment for an order
///
/// Registers a payment intent with the gateway and returns the checkout
/// authorization URL. The gateway reference is stored on the order before
/// this responds.
#[utoipa::path(
    post,
    path = "/api/v1/payments/initialize",
    responses(
        (status = 200, description = "Payment initialized"),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Payment gateway failure"),
    ),
    security(("Bearer" = [])),
    tag = "payments"
)]
pub async fn initialize_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<InitializePaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    // The order must belong to the caller unless they are staff.
    let order = state.services.orders.get_order(request.order_id).await?;
    if order.user_id != auth_user.user_id && !auth_user.is_admin() {
        return Err(ServiceError::NotFound(format!(
            "Order {} not found",
            request.order_id
        )));
    }

    let email = request.email.as_deref().unwrap_or(&auth_user.email);
    let response = state
        .services
        .payments
        .initialize_payment(request.order_id, email)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}
