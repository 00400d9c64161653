//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use marketline_core::{Marketplace, RetryPolicy, Seller};
use serde::{Deserialize, Deserializer};

/// Global configuration for marketline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub http: HttpConfig,
    pub identity: IdentityConfig,
    pub tiki: TikiConfig,
    pub shopee: ShopeeConfig,
    pub lazada: LazadaConfig,
    pub sellers: SellersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Detail/variant requests in flight across the whole run
    pub max_concurrency: usize,
    pub seller_concurrency: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 500,
            max_backoff_ms: 30_000,
            max_concurrency: 5,
            seller_concurrency: 4,
            connect_timeout_secs: 30,
            request_timeout_secs: 60,
        }
    }
}

impl HttpConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms),
        }
    }

    pub fn transport(&self) -> marketline_core::HttpConfig {
        marketline_core::HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Rotated round-robin; empty means the built-in Firefox strings
    #[serde(deserialize_with = "deserialize_env_list")]
    pub user_agents: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TikiConfig {
    #[serde(deserialize_with = "deserialize_env_string")]
    pub api_base: String,
    #[serde(deserialize_with = "deserialize_env_string")]
    pub web_base: String,
    pub page_size: u32,
}

impl Default for TikiConfig {
    fn default() -> Self {
        let d = marketline_tiki::Config::default();
        Self {
            api_base: d.api_base,
            web_base: d.web_base,
            page_size: d.page_size,
        }
    }
}

impl From<&TikiConfig> for marketline_tiki::Config {
    fn from(c: &TikiConfig) -> Self {
        Self {
            api_base: c.api_base.clone(),
            web_base: c.web_base.clone(),
            page_size: c.page_size,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopeeConfig {
    #[serde(deserialize_with = "deserialize_env_string")]
    pub base_url: String,
    pub page_size: u32,
}

impl Default for ShopeeConfig {
    fn default() -> Self {
        let d = marketline_shopee::Config::default();
        Self {
            base_url: d.base_url,
            page_size: d.page_size,
        }
    }
}

impl From<&ShopeeConfig> for marketline_shopee::Config {
    fn from(c: &ShopeeConfig) -> Self {
        Self {
            base_url: c.base_url.clone(),
            page_size: c.page_size,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LazadaConfig {
    #[serde(deserialize_with = "deserialize_env_string")]
    pub www_base: String,
    #[serde(deserialize_with = "deserialize_env_string")]
    pub pdp_base: String,
    pub page_size: u32,
    /// Pause between listing pages of one store
    pub page_delay_ms: u64,
}

impl Default for LazadaConfig {
    fn default() -> Self {
        let d = marketline_lazada::Config::default();
        Self {
            www_base: d.www_base,
            pdp_base: d.pdp_base,
            page_size: d.page_size,
            page_delay_ms: d.page_delay.as_millis() as u64,
        }
    }
}

impl From<&LazadaConfig> for marketline_lazada::Config {
    fn from(c: &LazadaConfig) -> Self {
        Self {
            www_base: c.www_base.clone(),
            pdp_base: c.pdp_base.clone(),
            page_size: c.page_size,
            page_delay: Duration::from_millis(c.page_delay_ms),
        }
    }
}

/// Seller slugs per marketplace, crawled in listed order
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SellersConfig {
    #[serde(deserialize_with = "deserialize_env_list")]
    pub tiki: Vec<String>,
    #[serde(deserialize_with = "deserialize_env_list")]
    pub shopee: Vec<String>,
    #[serde(deserialize_with = "deserialize_env_list")]
    pub lazada: Vec<String>,
}

impl SellersConfig {
    pub fn slugs(&self, marketplace: Marketplace) -> &[String] {
        match marketplace {
            Marketplace::Tiki => &self.tiki,
            Marketplace::Shopee => &self.shopee,
            Marketplace::Lazada => &self.lazada,
        }
    }

    /// All configured sellers, optionally restricted to one marketplace
    pub fn sellers(&self, only: Option<Marketplace>) -> Vec<Seller> {
        Marketplace::ALL
            .into_iter()
            .filter(|m| only.map_or(true, |o| o == *m))
            .flat_map(|m| self.slugs(m).iter().map(move |slug| Seller::new(m, slug.clone())))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.tiki.len() + self.shopee.len() + self.lazada.len()
    }
}

/// Deserialize a string that may be an environment variable reference like ${VAR}
fn deserialize_env_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    expand_env_var(&s).ok_or_else(|| serde::de::Error::custom(format!("{s} is not set")))
}

fn deserialize_env_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer)?
        .into_iter()
        .map(|s| expand_env_var(&s).ok_or_else(|| serde::de::Error::custom(format!("{s} is not set"))))
        .collect()
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./marketline.toml (current directory)
    /// 2. ~/.config/marketline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("marketline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "marketline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.dir, PathBuf::from("./data"));
        assert_eq!(config.http.max_concurrency, 5);
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.lazada.page_delay_ms, 1000);
        assert_eq!(config.tiki.page_size, 50);
        assert_eq!(config.sellers.total(), 0);
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("MARKETLINE_TEST_VAR", "test_value");
        assert_eq!(
            expand_env_var("${MARKETLINE_TEST_VAR}"),
            Some("test_value".to_string())
        );
        std::env::remove_var("MARKETLINE_TEST_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[output]
dir = "/tmp/catalog"

[http]
max_concurrency = 8
backoff_ms = 250

[lazada]
page_delay_ms = 1500

[sellers]
tiki = ["vua-nem-official-store"]
lazada = ["acme-official", "acme-outlet"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("/tmp/catalog"));
        assert_eq!(config.http.max_concurrency, 8);
        assert_eq!(config.http.max_retries, 3);
        let retry = config.http.retry_policy();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.base_delay, Duration::from_millis(250));
        assert_eq!(retry.max_delay, Duration::from_secs(30));

        let lazada = marketline_lazada::Config::from(&config.lazada);
        assert_eq!(lazada.page_delay, Duration::from_millis(1500));
        assert_eq!(lazada.page_size, 40);

        let sellers = config.sellers.sellers(None);
        assert_eq!(sellers.len(), 3);
        assert_eq!(sellers[0], Seller::new(Marketplace::Tiki, "vua-nem-official-store"));
        assert_eq!(sellers[2].slug, "acme-outlet");
        assert_eq!(config.sellers.sellers(Some(Marketplace::Shopee)), vec![]);
    }

    #[test]
    fn retry_policy_follows_max_retries() {
        let mut config = Config::default();
        config.http.max_retries = 7;
        let retry = config.http.retry_policy();
        assert_eq!(retry.max_retries, 7);
        assert_eq!(retry.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn seller_slug_from_env() {
        std::env::set_var("MARKETLINE_TEST_SHOP", "coolmate");
        let config: Config = toml::from_str("[sellers]\nshopee = [\"${MARKETLINE_TEST_SHOP}\"]").unwrap();
        std::env::remove_var("MARKETLINE_TEST_SHOP");
        assert_eq!(config.sellers.shopee, vec!["coolmate".to_string()]);
    }

    #[test]
    fn unset_env_reference_is_an_error() {
        let parsed: Result<Config, _> =
            toml::from_str("[tiki]\napi_base = \"${NONEXISTENT_VAR_12345}\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marketline.toml");
        std::fs::write(&path, "[output]\ndir = \"out\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }
}
