use crate::{
    db::DbPool,
    entities::{
        product::Entity as ProductEntity,
        wishlist::{self, ActiveModel as WishlistActiveModel, Entity as WishlistEntity},
        wishlist_item::{
            self, ActiveModel as WishlistItemActiveModel, Entity as WishlistItemEntity,
        },
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleWishlistRequest {
    pub product_id: Uuid,
}

/// Result of a toggle: whether the product was added or removed.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleWishlistResponse {
    pub product_id: Uuid,
    pub action: ToggleAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WishlistProduct {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub images: serde_json::Value,
    pub in_stock: bool,
}

/// Service for per-user wishlists. A wishlist row is created lazily on the
/// first toggle; membership has set semantics.
#[derive(Clone)]
pub struct WishlistService {
    db_pool: Arc<DbPool>,
}

impl WishlistService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Products on the caller's wishlist. An absent wishlist reads as empty.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistProduct>, ServiceError> {
        let db = &*self.db_pool;

        let Some(list) = WishlistEntity::find()
            .filter(wishlist::Column::UserId.eq(user_id))
            .one(db)
            .await?
        else {
            return Ok(Vec::new());
        };

        let pairs = WishlistItemEntity::find()
            .filter(wishlist_item::Column::WishlistId.eq(list.id))
            .find_also_related(ProductEntity)
            .all(db)
            .await?;

        Ok(pairs
            .into_iter()
            .filter_map(|(item, product)| {
                product.map(|p| WishlistProduct {
                    product_id: item.product_id,
                    name: p.name,
                    price: p.price,
                    images: p.images,
                    in_stock: p.stock > 0,
                })
            })
            .collect())
    }

    /// Add the product if absent, remove it if present.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %request.product_id))]
    pub async fn toggle(
        &self,
        user_id: Uuid,
        request: ToggleWishlistRequest,
    ) -> Result<ToggleWishlistResponse, ServiceError> {
        let db = &*self.db_pool;

        ProductEntity::find_by_id(request.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;

        let list = match WishlistEntity::find()
            .filter(wishlist::Column::UserId.eq(user_id))
            .one(db)
            .await?
        {
            Some(list) => list,
            None => {
                WishlistActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    created_at: Set(Utc::now()),
                }
                .insert(db)
                .await?
            }
        };

        let existing = WishlistItemEntity::find()
            .filter(wishlist_item::Column::WishlistId.eq(list.id))
            .filter(wishlist_item::Column::ProductId.eq(request.product_id))
            .one(db)
            .await?;

        let action = match existing {
            Some(item) => {
                item.delete(db).await?;
                ToggleAction::Removed
            }
            None => {
                WishlistItemActiveModel {
                    id: Set(Uuid::new_v4()),
                    wishlist_id: Set(list.id),
                    product_id: Set(request.product_id),
                    added_at: Set(Utc::now()),
                }
                .insert(db)
                .await?;
                ToggleAction::Added
            }
        };

        info!(user_id = %user_id, product_id = %request.product_id, action = ?action, "Wishlist toggled");
        Ok(ToggleWishlistResponse {
            product_id: request.product_id,
            action,
        })
    }
}
