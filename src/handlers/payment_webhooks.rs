use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde_json::json;
use tracing::warn;

use crate::services::payments::{ReconcileOutcome, WebhookEvent};
use crate::{errors::ServiceError, AppState};

const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Payment gateway webhook receiver
///
/// Unauthenticated by design; authenticity comes from the HMAC-SHA512
/// signature over the exact raw body. The body is taken as `Bytes` and
/// verified before any JSON parsing so re-serialization can never change
/// what was signed.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body(content = Vec<u8>, description = "Raw gateway event payload"),
    responses(
        (status = 200, description = "Event processed or already applied"),
        (status = 401, description = "Missing or invalid signature"),
        (status = 500, description = "Reconciliation failed; gateway should redeliver"),
    ),
    tag = "payments"
)]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized("Missing webhook signature".to_string()))?;

    if !state.services.payments.verify_signature(&body, signature) {
        warn!("Webhook rejected: signature mismatch");
        return Err(ServiceError::Unauthorized(
            "Invalid webhook signature".to_string(),
        ));
    }

    // A payload that signed correctly but does not parse is a fault on our
    // side of the contract; 500 keeps the gateway redelivering it.
    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::InternalError(format!("Malformed webhook payload: {}", e)))?;

    let outcome = state.services.payments.reconcile_webhook(event).await?;
    let status = match outcome {
        ReconcileOutcome::Applied => "processed",
        ReconcileOutcome::AlreadyApplied => "already_processed",
    };
    Ok(Json(json!({ "status": status })))
}
