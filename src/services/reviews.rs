use crate::{
    db::DbPool,
    entities::{
        product::Entity as ProductEntity,
        review::{self, ActiveModel as ReviewActiveModel, Entity as ReviewEntity},
        user::Entity as UserEntity,
    },
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
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub reviewer_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Service for product reviews.
#[derive(Clone)]
pub struct ReviewService {
    db_pool: Arc<DbPool>,
}

impl ReviewService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// A product's reviews, newest first, reviewer names attached.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_reviews(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ReviewResponse>, ServiceError> {
        let db = &*self.db_pool;

        ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let pairs = ReviewEntity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(db)
            .await?;

        Ok(pairs
            .into_iter()
            .map(|(r, user)| ReviewResponse {
                id: r.id,
                product_id: r.product_id,
                reviewer_name: user.map(|u| u.name).unwrap_or_else(|| "Anonymous".to_string()),
                rating: r.rating,
                comment: r.comment,
                created_at: r.created_at,
            })
            .collect())
    }

    #[instrument(skip(self, request), fields(product_id = %product_id, user_id = %user_id))]
    pub async fn create_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<ReviewResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let reviewer = UserEntity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let model = ReviewActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(user_id),
            rating: Set(request.rating),
            comment: Set(request.comment),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(review_id = %model.id, product_id = %product_id, "Review created");
        Ok(ReviewResponse {
            id: model.id,
            product_id: model.product_id,
            reviewer_name: reviewer.name,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at,
        })
    }
}
