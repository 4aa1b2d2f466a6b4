// Catalog
pub mod catalog;
pub mod image_normalizer;

// Checkout
pub mod order_intake;

// External adapters
pub mod notifications;
pub mod payment_gateway;
