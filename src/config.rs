//! Configuration management for the estat CLI
//!
//! Config is stored at ~/.config/estat/config.toml

use crate::api::FetchOptions;
use crate::error::{EstatError, EstatResult};
use crate::fetch::{MarkerSet, UrlStyle, CATALOG_URL, SDMX_BASE_URL};
use crate::freshness::FreshnessPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment override for the dataset endpoint
pub const BASE_URL_ENV: &str = "ESTAT_BASE_URL";

/// Environment override for the catalog listing URL
pub const CATALOG_URL_ENV: &str = "ESTAT_CATALOG_URL";

/// Config directory name
const CONFIG_DIR: &str = "estat";

/// Config file name
const CONFIG_FILE: &str = "config.toml";

/// estat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cache root (defaults to the platform cache directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum age of cached datasets, e.g. "1d", "12h", "unbounded"
    #[serde(default = "default_max_age")]
    pub max_age: String,

    /// Strip observation flags before parsing
    #[serde(default = "default_drop_markers")]
    pub drop_markers: bool,

    #[serde(default)]
    pub markers: MarkerSet,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub url_style: UrlStyle,

    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
}

fn default_max_age() -> String {
    FreshnessPolicy::default().to_string()
}

fn default_drop_markers() -> bool {
    true
}

fn default_base_url() -> String {
    SDMX_BASE_URL.to_string()
}

fn default_catalog_url() -> String {
    CATALOG_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_age: default_max_age(),
            drop_markers: default_drop_markers(),
            markers: MarkerSet::default(),
            base_url: default_base_url(),
            url_style: UrlStyle::default(),
            catalog_url: default_catalog_url(),
        }
    }
}

impl Config {
    /// Get the config directory path (~/.config/estat/)
    pub fn dir_path() -> EstatResult<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR))
            .ok_or_else(|| EstatError::ConfigError("Could not determine config directory".into()))
    }

    /// Get the config file path (~/.config/estat/config.toml)
    pub fn file_path() -> EstatResult<PathBuf> {
        Self::dir_path().map(|p| p.join(CONFIG_FILE))
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::file_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Load config from file, returning defaults if file doesn't exist
    pub fn load() -> EstatResult<Self> {
        let path = Self::file_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        Self::from_toml(&contents)
    }

    /// Load config and apply `ESTAT_*` environment overrides (never saved)
    pub fn load_effective() -> EstatResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Parse config text; blank text yields defaults
    pub fn from_toml(contents: &str) -> EstatResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(contents)
            .map_err(|e| EstatError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Ok(url) = std::env::var(CATALOG_URL_ENV) {
            self.catalog_url = url;
        }
    }

    /// Save config to file, creating directories if needed
    pub fn save(&self) -> EstatResult<()> {
        let dir = Self::dir_path()?;
        let path = Self::file_path()?;

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| {
            EstatError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(&path, contents)?;

        Ok(())
    }

    /// Validate the config values
    pub fn validate(&self) -> EstatResult<()> {
        for url in [&self.base_url, &self.catalog_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(EstatError::ConfigError(format!(
                    "URL must start with http:// or https://: {}",
                    url
                )));
            }
        }

        self.max_age_policy()?;
        Ok(())
    }

    pub fn max_age_policy(&self) -> EstatResult<FreshnessPolicy> {
        self.max_age.parse().map_err(EstatError::ConfigError)
    }

    /// Cache root: configured directory or the platform cache directory
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|p| p.join(CONFIG_DIR)))
    }

    /// Fetch options derived from this config
    pub fn fetch_options(&self) -> EstatResult<FetchOptions> {
        Ok(FetchOptions {
            drop_markers: self.drop_markers,
            markers: self.markers,
            cache_dir: self.resolved_cache_dir(),
            max_age: self.max_age_policy()?,
            base_url: self.base_url.clone(),
            url_style: self.url_style,
            catalog_url: self.catalog_url.clone(),
        })
    }
}
