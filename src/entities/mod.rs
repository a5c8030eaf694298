pub mod category;
pub mod coupon;
pub mod order;
pub mod order_item;
pub mod product;
pub mod review;
pub mod user;
pub mod wishlist;
pub mod wishlist_item;

// Re-export entities
pub use category::{Entity as Category, Model as CategoryModel};
pub use coupon::{Entity as Coupon, Model as CouponModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus, PaymentStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use user::{Entity as User, Model as UserModel, UserRole};
pub use wishlist::{Entity as Wishlist, Model as WishlistModel};
pub use wishlist_item::{Entity as WishlistItem, Model as WishlistItemModel};
