//! Configuration loading and root folder resolution
//!
//! Root folder resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `SHELF_ROOT_FOLDER` environment variable
//! 3. `root_folder` key in the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup; the service logs a
//! warning and runs on defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SHELF_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "shelf.db";

/// Contents of `shelf.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub engagement: EngagementConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive; `RUST_LOG` overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5740".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Upper bound on one retailer page fetch
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            user_agent: concat!("shelf/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Upper bound on review content length, in characters
    pub review_max_chars: usize,
    /// Reviews per page when the caller gives no `limit`
    pub reviews_page_limit: i64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            review_max_chars: 1000,
            reviews_page_limit: 10,
        }
    }
}

impl TomlConfig {
    /// Reject values that would make the service misbehave
    pub fn validate(&self) -> Result<()> {
        if self.scraper.timeout_secs == 0 {
            return Err(Error::Config("scraper.timeout_secs must be positive".to_string()));
        }
        if self.engagement.review_max_chars == 0 {
            return Err(Error::Config(
                "engagement.review_max_chars must be positive".to_string(),
            ));
        }
        if self.engagement.reviews_page_limit < 1 {
            return Err(Error::Config(
                "engagement.reviews_page_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Where the effective configuration came from
#[derive(Debug)]
pub enum ConfigSource {
    /// No file at the given location (or no location at all)
    Defaults,
    File(PathBuf),
    /// The file exists but was rejected; defaults are in effect
    Fallback(Error),
}

/// Load the config file, falling back to defaults on any problem
///
/// Nothing is logged here: the caller usually reads the log level from the
/// result before tracing is initialised, then reports the source.
pub fn load_or_default(path: Option<&Path>) -> (TomlConfig, ConfigSource) {
    let Some(path) = path.filter(|p| p.exists()) else {
        return (TomlConfig::default(), ConfigSource::Defaults);
    };

    match load_toml_config(path) {
        Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
        Err(e) => (TomlConfig::default(), ConfigSource::Fallback(e)),
    }
}

/// Platform config file location (`~/.config/shelf/shelf.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shelf").join("shelf.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("shelf"))
        .unwrap_or_else(|| PathBuf::from("./shelf_data"))
}

/// Resolves the root folder from CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Prepares the resolved root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}
