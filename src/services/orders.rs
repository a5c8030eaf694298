use crate::{
    db::DbPool,
    entities::{
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, OrderStatus, PaymentStatus},
        order_item::{self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity},
        product::Entity as ProductEntity,
        user::Entity as UserEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One requested order line. Any client-supplied price is ignored; the
/// unit price is always read fresh from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
    #[validate(length(min = 1, message = "Shipping address is required"))]
    pub shipping_address: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin listing row: order header plus customer identity and line count.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminOrderRow {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub item_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminOrderListResponse {
    pub orders: Vec<AdminOrderRow>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for order placement and order reads.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order for `user_id`.
    ///
    /// Every line is priced from the catalog at this moment; the snapshot
    /// is what the customer pays even if the product is re-priced later.
    /// Stock is checked but NOT decremented here — the decrement belongs to
    /// payment confirmation.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        // Price and check every line against the live catalog.
        let mut priced_lines: Vec<(OrderItemRequest, Decimal, String)> =
            Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = ProductEntity::find_by_id(item.product_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if !product.is_active {
                return Err(ServiceError::NotFound(format!(
                    "Product {} not found",
                    item.product_id
                )));
            }
            if product.stock < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    product.name, product.stock, item.quantity
                )));
            }

            priced_lines.push((item.clone(), product.price, product.name));
        }

        let total_amount: Decimal = priced_lines
            .iter()
            .map(|(item, unit_price, _)| *unit_price * Decimal::from(item.quantity))
            .sum();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = OrderActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            total_amount: Set(total_amount),
            shipping_address: Set(request.shipping_address.clone()),
            status: Set(OrderStatus::Processing),
            payment_status: Set(PaymentStatus::Pending),
            payment_reference: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut item_responses = Vec::with_capacity(priced_lines.len());
        for (item, unit_price, product_name) in &priced_lines {
            let inserted = OrderItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(*unit_price),
                size: Set(item.size.clone()),
                color: Set(item.color.clone()),
            }
            .insert(&txn)
            .await?;

            item_responses.push(OrderItemResponse {
                id: inserted.id,
                product_id: inserted.product_id,
                product_name: Some(product_name.clone()),
                quantity: inserted.quantity,
                unit_price: inserted.unit_price,
                size: inserted.size,
                color: inserted.color,
            });
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, total = %total_amount, "Order created");
        self.event_sender
            .send(Event::OrderCreated { order_id, user_id })
            .await;

        Ok(OrderResponse {
            id: order_model.id,
            user_id: order_model.user_id,
            total_amount: order_model.total_amount,
            shipping_address: order_model.shipping_address,
            status: order_model.status,
            payment_status: order_model.payment_status,
            payment_reference: order_model.payment_reference,
            items: item_responses,
            created_at: order_model.created_at,
            updated_at: order_model.updated_at,
        })
    }

    /// The caller's orders, newest first, items and product names attached.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn my_orders(&self, user_id: Uuid) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let orders = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(db)
            .await?;

        let mut responses = Vec::with_capacity(orders.len());
        for order_model in orders {
            let items = self.load_items(order_model.id).await?;
            responses.push(OrderResponse {
                id: order_model.id,
                user_id: order_model.user_id,
                total_amount: order_model.total_amount,
                shipping_address: order_model.shipping_address,
                status: order_model.status,
                payment_status: order_model.payment_status,
                payment_reference: order_model.payment_reference,
                items,
                created_at: order_model.created_at,
                updated_at: order_model.updated_at,
            });
        }
        Ok(responses)
    }

    /// Fetch a single order with its items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order_model = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = self.load_items(order_model.id).await?;
        Ok(OrderResponse {
            id: order_model.id,
            user_id: order_model.user_id,
            total_amount: order_model.total_amount,
            shipping_address: order_model.shipping_address,
            status: order_model.status,
            payment_status: order_model.payment_status,
            payment_reference: order_model.payment_reference,
            items,
            created_at: order_model.created_at,
            updated_at: order_model.updated_at,
        })
    }

    /// Admin view: all orders with customer identity, paginated, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<AdminOrderListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut rows = Vec::with_capacity(orders.len());
        for order_model in orders {
            let customer = UserEntity::find_by_id(order_model.user_id).one(db).await?;
            let item_count = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.eq(order_model.id))
                .count(db)
                .await?;

            let (customer_name, customer_email) = customer
                .map(|u| (u.name, u.email))
                .unwrap_or_else(|| ("<deleted>".to_string(), String::new()));

            rows.push(AdminOrderRow {
                id: order_model.id,
                customer_name,
                customer_email,
                total_amount: order_model.total_amount,
                status: order_model.status,
                payment_status: order_model.payment_status,
                item_count,
                created_at: order_model.created_at,
            });
        }

        Ok(AdminOrderListResponse {
            orders: rows,
            total,
            page,
            per_page,
        })
    }

    /// Admin fulfillment-status update.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let status = match request.status.as_str() {
            "processing" => OrderStatus::Processing,
            "shipped" => OrderStatus::Shipped,
            "delivered" => OrderStatus::Delivered,
            "cancelled" => OrderStatus::Cancelled,
            other => {
                return Err(ServiceError::InvalidInput(format!(
                    "Unknown order status: {}",
                    other
                )))
            }
        };

        let db = &*self.db_pool;
        let order_model = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let mut active: OrderActiveModel = order_model.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        info!(order_id = %order_id, status = ?status, "Order status updated");
        self.event_sender
            .send(Event::OrderStatusUpdated {
                order_id,
                status: request.status,
            })
            .await;

        let items = self.load_items(updated.id).await?;
        Ok(OrderResponse {
            id: updated.id,
            user_id: updated.user_id,
            total_amount: updated.total_amount,
            shipping_address: updated.shipping_address,
            status: updated.status,
            payment_status: updated.payment_status,
            payment_reference: updated.payment_reference,
            items,
            created_at: updated.created_at,
            updated_at: updated.updated_at,
        })
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<OrderItemResponse>, ServiceError> {
        let db = &*self.db_pool;

        let pairs = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .find_also_related(ProductEntity)
            .all(db)
            .await?;

        Ok(pairs
            .into_iter()
            .map(|(item, product)| OrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: product.map(|p| p.name),
                quantity: item.quantity,
                unit_price: item.unit_price,
                size: item.size,
                color: item.color,
            })
            .collect())
    }
}
