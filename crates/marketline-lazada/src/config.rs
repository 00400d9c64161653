//! Lazada adapter configuration

use std::time::Duration;

/// Endpoints, paging and pacing for the Lazada adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Store pages and shop lookup
    pub www_base: String,
    /// Product detail pages
    pub pdp_base: String,
    pub page_size: u32,
    /// Pause between consecutive listing pages of one store
    pub page_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            www_base: "https://www.lazada.vn".to_string(),
            pdp_base: "https://pdp.lazada.vn".to_string(),
            page_size: 40,
            page_delay: Duration::from_millis(1000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.page_size, 40);
        assert_eq!(config.page_delay, Duration::from_secs(1));
        assert!(config.www_base.starts_with("https://"));
    }
}
