//! Marketline Lazada - Lazada store adapter
//!
//! Resolves the seller id from the store name, pages the store listing with
//! a pause between pages, and expands every SKU of an item with a request of
//! its own.

pub mod api;
pub mod config;
pub mod transform;

// Re-exports
pub use api::LazadaAdapter;
pub use config::Config;
pub use transform::{SCHEMA, normalize};
