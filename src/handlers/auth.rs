use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::services::accounts::{LoginRequest, RegisterRequest};
use crate::{errors::ServiceError, ApiResponse, AppState};

/// Register a new customer account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state.services.accounts.register(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    responses(
        (status = 200, description = "Authenticated"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state.services.accounts.login(request).await?;
    Ok(Json(ApiResponse::success(response)))
}
