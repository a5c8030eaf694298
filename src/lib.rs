/*!
 * # Storefront API
 *
 * Backend for a direct-to-consumer fashion storefront: catalog browsing,
 * accounts, orders, gateway payments and a back-office surface. The
 * critical path is order placement -> payment initialization ->
 * signature-verified, idempotent webhook reconciliation.
 */

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<auth::AuthService>,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::categories::list_categories,
        handlers::categories::create_category,
        handlers::orders::create_order,
        handlers::orders::my_orders,
        handlers::payments::initialize_payment,
        handlers::payment_webhooks::handle_webhook,
        handlers::reviews::list_reviews,
        handlers::reviews::create_review,
        handlers::wishlists::get_wishlist,
        handlers::wishlists::toggle_wishlist,
        handlers::admin::list_orders,
        handlers::admin::update_order_status,
        handlers::admin::list_customers,
        handlers::admin::assign_role,
        handlers::admin::list_coupons,
        handlers::admin::create_coupon,
        handlers::admin::deactivate_coupon,
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "catalog", description = "Products and categories"),
        (name = "orders", description = "Order placement and history"),
        (name = "payments", description = "Gateway integration and webhooks"),
        (name = "reviews", description = "Product reviews"),
        (name = "wishlist", description = "Per-user wishlists"),
        (name = "admin", description = "Back-office operations"),
    )
)]
pub struct ApiDoc;

/// All `/api/v1` routes. Authentication and role checks happen inside the
/// handlers via the `AuthUser` extractor.
pub fn api_v1_routes() -> Router<AppState> {
    use axum::routing::{delete, post, put};

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Auth
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // Catalog
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/products/:id/reviews",
            get(handlers::reviews::list_reviews).post(handlers::reviews::create_review),
        )
        .route(
            "/categories",
            get(handlers::categories::list_categories)
                .post(handlers::categories::create_category),
        )
        // Orders
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/mine", get(handlers::orders::my_orders))
        // Payments
        .route(
            "/payments/initialize",
            post(handlers::payments::initialize_payment),
        )
        .route(
            "/payments/webhook",
            post(handlers::payment_webhooks::handle_webhook),
        )
        // Wishlist
        .route(
            "/wishlist",
            get(handlers::wishlists::get_wishlist).post(handlers::wishlists::toggle_wishlist),
        )
        // Admin
        .route("/admin/orders", get(handlers::admin::list_orders))
        .route(
            "/admin/orders/:id/status",
            put(handlers::admin::update_order_status),
        )
        .route("/admin/customers", get(handlers::admin::list_customers))
        .route(
            "/admin/customers/:id/role",
            put(handlers::admin::assign_role),
        )
        .route(
            "/admin/coupons",
            get(handlers::admin::list_coupons).post(handlers::admin::create_coupon),
        )
        .route(
            "/admin/coupons/:id",
            delete(handlers::admin::deactivate_coupon),
        )
}

/// The complete application router: liveness root, versioned API and
/// swagger-ui.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .nest("/api/v1", api_v1_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "storefront-api" }))
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "storefront-api",
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(health_data)))
}
