//! Marketline Tiki - Tiki seller-store adapter
//!
//! Lists a store by its slug (no shop lookup needed) and reads product
//! details from the web API. Variants come inline as `configurable_products`.

pub mod api;
pub mod config;
pub mod transform;

// Re-exports
pub use api::TikiAdapter;
pub use config::Config;
pub use transform::{SCHEMA, normalize};
