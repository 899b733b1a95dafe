use crate::api::odds_api::ODDS_API_BASE_URL;
use crate::error::{OddsError, Result};

const DEFAULT_REGIONS: &str = "us";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_CACHE_DIR: &str = "cache";

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub odds_api_key: Option<String>,
    pub odds_api_base_url: String,
    pub regions: String,
    pub bind_addr: String,
    pub cache_dir: String,
    pub use_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            odds_api_key: None,
            odds_api_base_url: ODDS_API_BASE_URL.to_string(),
            regions: DEFAULT_REGIONS.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            use_cache: false,
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read settings from the environment.
    /// A missing API key is not an error here; it is reported when a
    /// request actually needs the provider.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            odds_api_key: non_empty("ODDS_API_KEY"),
            odds_api_base_url: non_empty("ODDS_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.odds_api_base_url),
            regions: non_empty("ODDS_REGIONS").unwrap_or(defaults.regions),
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cache_dir: non_empty("CACHE_DIR").unwrap_or(defaults.cache_dir),
            use_cache: lookup("USE_CACHE").unwrap_or_default() == "1",
        }
    }

    pub fn api_key(&self) -> Result<&str> {
        self.odds_api_key.as_deref().ok_or(OddsError::MissingApiKey)
    }

    pub fn cache_file(&self, name: &str) -> String {
        format!("{}/{}", self.cache_dir, name)
    }
}
