//! Marketline Shopee - Shopee shop adapter
//!
//! Resolves the numeric shop id from the shop username once per seller,
//! pages through the shop's items by offset, and reads each item with its
//! inline `models` as variants.

pub mod api;
pub mod config;
pub mod transform;

// Re-exports
pub use api::ShopeeAdapter;
pub use config::Config;
pub use transform::{PRICE_SCALE, SCHEMA, normalize};
