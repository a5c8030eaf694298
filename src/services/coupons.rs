use crate::{
    db::DbPool,
    entities::coupon::{self, ActiveModel as CouponActiveModel, Entity as CouponEntity},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, message = "Coupon code is required"))]
    pub code: String,
    #[validate(range(min = 1, max = 100, message = "Discount must be between 1 and 100 percent"))]
    pub percent_off: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CouponResponse {
    pub id: Uuid,
    pub code: String,
    pub percent_off: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Admin-only coupon management. Coupons are promotional records; nothing
/// in checkout consumes them.
#[derive(Clone)]
pub struct CouponService {
    db_pool: Arc<DbPool>,
}

impl CouponService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_coupons(&self) -> Result<Vec<CouponResponse>, ServiceError> {
        let db = &*self.db_pool;
        let coupons = CouponEntity::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(coupons.into_iter().map(model_to_response).collect())
    }

    #[instrument(skip(self, request))]
    pub async fn create_coupon(
        &self,
        request: CreateCouponRequest,
    ) -> Result<CouponResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let code = request.code.trim().to_uppercase();

        let duplicate = CouponEntity::find()
            .filter(coupon::Column::Code.eq(code.as_str()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Coupon '{}' already exists",
                code
            )));
        }

        let model = CouponActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            percent_off: Set(request.percent_off),
            expires_at: Set(request.expires_at),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(coupon_id = %model.id, code = %model.code, "Coupon created");
        Ok(model_to_response(model))
    }

    /// Deactivate rather than delete, so issued codes stay auditable.
    #[instrument(skip(self), fields(coupon_id = %coupon_id))]
    pub async fn deactivate_coupon(&self, coupon_id: Uuid) -> Result<CouponResponse, ServiceError> {
        let db = &*self.db_pool;
        let existing = CouponEntity::find_by_id(coupon_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", coupon_id)))?;

        let mut active: CouponActiveModel = existing.into();
        active.is_active = Set(false);
        let updated = active.update(db).await?;

        info!(coupon_id = %coupon_id, "Coupon deactivated");
        Ok(model_to_response(updated))
    }
}

fn model_to_response(model: coupon::Model) -> CouponResponse {
    CouponResponse {
        id: model.id,
        code: model.code,
        percent_off: model.percent_off,
        expires_at: model.expires_at,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}
