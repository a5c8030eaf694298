use crate::{
    db::DbPool,
    entities::{
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, PaymentStatus},
        order_item::{self, Entity as OrderItemEntity},
        product::{self, Entity as ProductEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use hmac::{Hmac, Mac};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

type HmacSha512 = Hmac<Sha512>;

/// Outcome of webhook reconciliation. Both variants map to HTTP 200 —
/// the gateway must not redeliver an event we have already absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The `PENDING -> PAID` transition was applied and stock decremented.
    Applied,
    /// The order was already `PAID` (or the event kind is not one we act
    /// on); nothing changed.
    AlreadyApplied,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitializePaymentResponse {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Request body sent to the gateway's transaction initializer.
#[derive(Debug, Serialize)]
struct GatewayInitializeRequest {
    email: String,
    /// Amount in the currency's minor unit (kobo for NGN).
    amount: i64,
    metadata: GatewayMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct GatewayMetadata {
    #[serde(rename = "orderId")]
    order_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct GatewayInitializeResponse {
    status: bool,
    data: Option<GatewayInitializeData>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayInitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

/// Webhook payload shape. Unknown event kinds deserialize fine and are
/// acknowledged without action.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub reference: Option<String>,
    pub metadata: Option<WebhookMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMetadata {
    #[serde(rename = "orderId")]
    pub order_id: Option<Uuid>,
}

/// HTTP client for the payment gateway.
#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaymentGateway {
    pub fn new(base_url: String, secret_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            secret_key,
        }
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Register a payment intent with the gateway. `amount_kobo` is the
    /// order total in the minor currency unit.
    async fn initialize(
        &self,
        email: &str,
        amount_kobo: i64,
        order_id: Uuid,
    ) -> Result<GatewayInitializeData, ServiceError> {
        let url = format!("{}/transaction/initialize", self.base_url);
        let body = GatewayInitializeRequest {
            email: email.to_string(),
            amount: amount_kobo,
            metadata: GatewayMetadata { order_id },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, order_id = %order_id, "Payment gateway request failed");
                ServiceError::PaymentGatewayError("Payment gateway unreachable".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, order_id = %order_id, "Payment gateway returned an error");
            return Err(ServiceError::PaymentGatewayError(format!(
                "Payment gateway returned {}",
                status
            )));
        }

        let parsed: GatewayInitializeResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to decode gateway response");
            ServiceError::PaymentGatewayError("Invalid gateway response".to_string())
        })?;

        match (parsed.status, parsed.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(ServiceError::PaymentGatewayError(
                parsed
                    .message
                    .unwrap_or_else(|| "Gateway rejected the transaction".to_string()),
            )),
        }
    }
}

/// Service for payment initialization and webhook reconciliation.
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    gateway: PaymentGateway,
    event_sender: EventSender,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>, gateway: PaymentGateway, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            gateway,
            event_sender,
        }
    }

    /// Verify the webhook signature: HMAC-SHA512 of the exact raw body,
    /// hex-encoded, compared in constant time against the header value.
    pub fn verify_signature(&self, body: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha512::new_from_slice(self.gateway.secret_key().as_bytes()) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }

    /// Initialize payment for an order: register an intent with the gateway
    /// and persist the returned reference on the order before replying.
    ///
    /// A gateway failure leaves the order untouched and `PENDING`; the
    /// client may simply retry, and a later initialization overwrites the
    /// stored reference.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn initialize_payment(
        &self,
        order_id: Uuid,
        email: &str,
    ) -> Result<InitializePaymentResponse, ServiceError> {
        let db = &*self.db_pool;

        let order_model = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order_model.payment_status == PaymentStatus::Paid {
            return Err(ServiceError::InvalidInput(
                "Order has already been paid".to_string(),
            ));
        }

        let amount_kobo = to_minor_unit(order_model.total_amount)?;
        let data = self.gateway.initialize(email, amount_kobo, order_id).await?;

        // The reference must be on the order before the caller sees it, or
        // a webhook arriving first would find nothing to correlate.
        let mut active: OrderActiveModel = order_model.into();
        active.payment_reference = Set(Some(data.reference.clone()));
        active.updated_at = Set(chrono::Utc::now());
        active.update(db).await?;

        info!(order_id = %order_id, reference = %data.reference, "Payment initialized");
        self.event_sender
            .send(Event::PaymentInitialized {
                order_id,
                reference: data.reference.clone(),
            })
            .await;

        Ok(InitializePaymentResponse {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    /// Reconcile a verified webhook event.
    ///
    /// For `charge.success` with an order id in the metadata, performs the
    /// `PENDING -> PAID` transition and decrements stock, all inside one
    /// transaction:
    ///
    /// - The transition is a guarded compare-and-swap; zero rows affected
    ///   means a redelivery already applied it, which is a success no-op.
    /// - Each item's decrement is conditional on `stock >= quantity`. A
    ///   failed decrement aborts the transaction so neither the payment
    ///   flag nor any stock moves.
    #[instrument(skip(self, event))]
    pub async fn reconcile_webhook(
        &self,
        event: WebhookEvent,
    ) -> Result<ReconcileOutcome, ServiceError> {
        if event.event != "charge.success" {
            info!(event = %event.event, "Ignoring unhandled webhook event");
            return Ok(ReconcileOutcome::AlreadyApplied);
        }

        let order_id = event
            .data
            .metadata
            .as_ref()
            .and_then(|m| m.order_id)
            .ok_or_else(|| {
                warn!("charge.success event without an order id in metadata");
                ServiceError::InternalError("Webhook metadata missing order id".to_string())
            })?;

        let reference = event.data.reference.clone().unwrap_or_default();

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start reconciliation transaction");
            ServiceError::DatabaseError(e)
        })?;

        // Compare-and-swap: only a PENDING order transitions. A replayed
        // event matches zero rows and changes nothing.
        let swap = OrderEntity::update_many()
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Paid),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Pending))
            .exec(&txn)
            .await?;

        if swap.rows_affected == 0 {
            // Either already PAID (redelivery) or the order is unknown.
            // Confirm existence so a bogus order id still surfaces.
            let exists = OrderEntity::find_by_id(order_id).one(&txn).await?.is_some();
            txn.rollback().await.map_err(ServiceError::DatabaseError)?;
            if exists {
                info!(order_id = %order_id, "Webhook redelivery, payment already applied");
                return Ok(ReconcileOutcome::AlreadyApplied);
            }
            // A confirmed charge for an order this store never issued is a
            // store-side inconsistency, not a client mistake.
            error!(order_id = %order_id, "charge.success for an unknown order");
            return Err(ServiceError::InternalError(format!(
                "Order {} referenced by webhook does not exist",
                order_id
            )));
        }

        // First application: move stock for every line or none.
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;

        for item in &items {
            let decrement = ProductEntity::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(item.quantity),
                )
                .filter(product::Column::Id.eq(item.product_id))
                .filter(product::Column::Stock.gte(item.quantity))
                .exec(&txn)
                .await?;

            if decrement.rows_affected == 0 {
                error!(
                    order_id = %order_id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    "Stock decrement failed during reconciliation, aborting"
                );
                txn.rollback().await.map_err(ServiceError::DatabaseError)?;
                return Err(ServiceError::InternalError(format!(
                    "Could not decrement stock for product {}",
                    item.product_id
                )));
            }
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit reconciliation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, reference = %reference, "Payment confirmed, stock decremented");
        self.event_sender
            .send(Event::PaymentConfirmed {
                order_id,
                reference,
            })
            .await;

        Ok(ReconcileOutcome::Applied)
    }

}

/// Convert a decimal major-unit amount to the gateway's integer minor unit
/// (×100). Fractional kobo cannot occur with catalog prices but a fractional
/// result is rejected rather than silently truncated.
fn to_minor_unit(amount: Decimal) -> Result<i64, ServiceError> {
    let scaled = amount * Decimal::from(100);
    if scaled.fract() != Decimal::ZERO {
        return Err(ServiceError::InternalError(
            "Order total is not representable in the minor currency unit".to_string(),
        ));
    }
    scaled
        .to_i64()
        .ok_or_else(|| ServiceError::InternalError("Order total out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_major_to_minor_unit() {
        assert_eq!(to_minor_unit(dec!(170000)).unwrap(), 17_000_000);
        assert_eq!(to_minor_unit(dec!(0.5)).unwrap(), 50);
        assert_eq!(to_minor_unit(dec!(85000.25)).unwrap(), 8_500_025);
    }

    #[test]
    fn rejects_fractional_minor_units() {
        assert!(to_minor_unit(dec!(0.005)).is_err());
    }

    #[test]
    fn signature_verification_matches_hmac_sha512() {
        let gateway = PaymentGateway::new(
            "http://localhost".to_string(),
            "sk_test_secret".to_string(),
            Duration::from_secs(5),
        );
        let (sender, _rx) = crate::events::event_channel(1);
        let service = PaymentService {
            db_pool: Arc::new(sea_orm::DatabaseConnection::Disconnected),
            gateway,
            event_sender: sender,
        };

        let body = br#"{"event":"charge.success"}"#;
        let mut mac = HmacSha512::new_from_slice(b"sk_test_secret").unwrap();
        mac.update(body);
        let good = hex::encode(mac.finalize().into_bytes());

        assert!(service.verify_signature(body, &good));
        assert!(!service.verify_signature(body, &good.replace('a', "b")));
        assert!(!service.verify_signature(b"tampered", &good));
        assert!(!service.verify_signature(body, "not-hex!!"));
    }

    #[test]
    fn unknown_webhook_events_deserialize() {
        let raw = r#"{"event":"transfer.success","data":{"reference":"r1"}}"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event, "transfer.success");
        assert!(event.data.metadata.is_none());
    }
}
