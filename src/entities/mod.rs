pub mod apparel_product;
pub mod order;

pub use apparel_product::{Category, ProductStatus, Size};
pub use order::{OrderStatus, PaymentMode, PaymentStatus};
