//! Tiki adapter configuration

/// Endpoints and paging for the Tiki adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Seller-store listing API
    pub api_base: String,
    /// Product detail API
    pub web_base: String,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.tiki.vn".to_string(),
            web_base: "https://tiki.vn".to_string(),
            page_size: 50,
        }
    }
}
