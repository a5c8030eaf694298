pub mod admin;
pub mod auth;
pub mod categories;
pub mod orders;
pub mod payment_webhooks;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod wishlists;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    AccountService, CatalogService, CouponService, OrderService, PaymentService, ReviewService,
    WishlistService,
};
use crate::services::payments::PaymentGateway;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub accounts: Arc<AccountService>,
    pub wishlists: Arc<WishlistService>,
    pub reviews: Arc<ReviewService>,
    pub coupons: Arc<CouponService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        gateway: PaymentGateway,
        auth_service: Arc<crate::auth::AuthService>,
    ) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone(), event_sender.clone())),
            payments: Arc::new(PaymentService::new(
                db_pool.clone(),
                gateway,
                event_sender.clone(),
            )),
            accounts: Arc::new(AccountService::new(
                db_pool.clone(),
                auth_service,
                event_sender,
            )),
            wishlists: Arc::new(WishlistService::new(db_pool.clone())),
            reviews: Arc::new(ReviewService::new(db_pool.clone())),
            coupons: Arc::new(CouponService::new(db_pool)),
        }
    }
}
