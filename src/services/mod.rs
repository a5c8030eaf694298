pub mod accounts;
pub mod catalog;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod wishlists;

pub use accounts::AccountService;
pub use catalog::CatalogService;
pub use coupons::CouponService;
pub use orders::OrderService;
pub use payments::PaymentService;
pub use reviews::ReviewService;
pub use wishlists::WishlistService;
