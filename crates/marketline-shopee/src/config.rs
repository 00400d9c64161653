//! Shopee adapter configuration

/// Endpoints and paging for the Shopee adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    /// Items per `search_items` request
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://shopee.vn".to_string(),
            page_size: 30,
        }
    }
}
