use crate::{
    db::DbPool,
    entities::{
        category::{self, ActiveModel as CategoryActiveModel, Entity as CategoryEntity},
        product::{self, ActiveModel as ProductActiveModel, Entity as ProductEntity},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Sort orders accepted by the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub sort: Option<ProductSort>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub price_usd: Option<Decimal>,
    pub category_id: Uuid,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
}

/// Partial update; absent fields are left as they are. `stock` is an
/// absolute value, not a delta.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub price_usd: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category slug is required"))]
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub price_usd: Option<Decimal>,
    pub category_id: Uuid,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub product_count: u64,
}

/// Service for catalog reads and admin catalog management.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Public product listing: active products only, optional category-slug
    /// filter, sortable, paginated.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<ProductListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let mut finder = ProductEntity::find().filter(product::Column::IsActive.eq(true));

        if let Some(slug) = &query.category {
            let cat = CategoryEntity::find()
                .filter(category::Column::Slug.eq(slug.as_str()))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", slug)))?;
            finder = finder.filter(product::Column::CategoryId.eq(cat.id));
        }

        finder = match query.sort.unwrap_or_default() {
            ProductSort::Newest => finder.order_by_desc(product::Column::CreatedAt),
            ProductSort::PriceLow => finder.order_by_asc(product::Column::Price),
            ProductSort::PriceHigh => finder.order_by_desc(product::Column::Price),
        };

        let paginator = finder.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductListResponse {
            products: products.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;
        let product = ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(model_to_response(product))
    }

    #[instrument(skip(self, request))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        if request.price <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Price must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        CategoryEntity::find_by_id(request.category_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category {} not found", request.category_id))
            })?;

        let now = Utc::now();
        let model = ProductActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            price: Set(request.price),
            price_usd: Set(request.price_usd),
            category_id: Set(request.category_id),
            images: Set(serde_json::json!(request.images)),
            sizes: Set(serde_json::json!(request.sizes)),
            colors: Set(serde_json::json!(request.colors)),
            stock: Set(request.stock),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(product_id = %model.id, "Product created");
        Ok(model_to_response(model))
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;
        let existing = ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if let Some(price) = request.price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "Price must be positive".to_string(),
                ));
            }
        }
        if let Some(stock) = request.stock {
            if stock < 0 {
                return Err(ServiceError::InvalidInput(
                    "Stock cannot be negative".to_string(),
                ));
            }
        }
        if let Some(category_id) = request.category_id {
            CategoryEntity::find_by_id(category_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Category {} not found", category_id))
                })?;
        }

        let mut active: ProductActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(price_usd) = request.price_usd {
            active.price_usd = Set(Some(price_usd));
        }
        if let Some(category_id) = request.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(images) = request.images {
            active.images = Set(serde_json::json!(images));
        }
        if let Some(sizes) = request.sizes {
            active.sizes = Set(serde_json::json!(sizes));
        }
        if let Some(colors) = request.colors {
            active.colors = Set(serde_json::json!(colors));
        }
        if let Some(stock) = request.stock {
            active.stock = Set(stock);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        info!(product_id = %product_id, "Product updated");
        Ok(model_to_response(updated))
    }

    /// Soft delete: the product disappears from public listings but stays
    /// referenced by historical order items.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let mut active: ProductActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        info!(product_id = %product_id, "Product deactivated");
        Ok(())
    }

    /// Name-ordered category list with per-category product counts.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryResponse>, ServiceError> {
        let db = &*self.db_pool;
        let categories = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(db)
            .await?;

        let mut responses = Vec::with_capacity(categories.len());
        for cat in categories {
            let product_count = ProductEntity::find()
                .filter(product::Column::CategoryId.eq(cat.id))
                .filter(product::Column::IsActive.eq(true))
                .count(db)
                .await?;
            responses.push(CategoryResponse {
                id: cat.id,
                name: cat.name,
                slug: cat.slug,
                product_count,
            });
        }
        Ok(responses)
    }

    #[instrument(skip(self, request))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let duplicate = CategoryEntity::find()
            .filter(category::Column::Slug.eq(request.slug.as_str()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category slug '{}' already exists",
                request.slug
            )));
        }

        let model = CategoryActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            slug: Set(request.slug),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(category_id = %model.id, "Category created");
        Ok(CategoryResponse {
            id: model.id,
            name: model.name,
            slug: model.slug,
            product_count: 0,
        })
    }
}

fn model_to_response(model: product::Model) -> ProductResponse {
    ProductResponse {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        price_usd: model.price_usd,
        category_id: model.category_id,
        images: json_strings(&model.images),
        sizes: json_strings(&model.sizes),
        colors: json_strings(&model.colors),
        stock: model.stock,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn json_strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
