//! Configuration for stowage
//!
//! Database location, HTTP bind address, label prefixes, search limits and
//! wardrobe basket names. Loaded from TOML or JSON, with environment overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "STOWAGE_CONFIG";
/// Environment variable overriding `server.addr`
pub const ADDR_ENV: &str = "STOWAGE_ADDR";
/// Environment variable overriding `database.path`
pub const DB_ENV: &str = "STOWAGE_DB";

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StowageConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub inventory: InventoryConfig,
    pub wardrobe: WardrobeConfig,
}

/// SQLite database settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("stowage").join("stowage.db"),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Item and location behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Prefix for generated location label ids
    pub location_qr_prefix: String,
    /// Prefix for generated item label ids
    pub item_qr_prefix: String,
    /// Maximum hits returned per kind by a search
    pub search_limit: u32,
    /// History entries returned when the caller gives no limit
    pub history_limit: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            location_qr_prefix: "psms-loc-".to_string(),
            item_qr_prefix: "psms-item-".to_string(),
            search_limit: 25,
            history_limit: 100,
        }
    }
}

/// Wardrobe behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardrobeConfig {
    /// Name given to a provisioned worn-clothes basket
    pub worn_basket_name: String,
    /// Name given to a provisioned dirty-laundry basket
    pub dirty_basket_name: String,
}

impl Default for WardrobeConfig {
    fn default() -> Self {
        Self {
            worn_basket_name: "Worn Clothes".to_string(),
            dirty_basket_name: "Dirty Laundry".to_string(),
        }
    }
}

impl StowageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a config file; `.json` files are parsed as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then `STOWAGE_CONFIG` file, then `STOWAGE_ADDR` / `STOWAGE_DB`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(ADDR_ENV).ok(),
            std::env::var_os(DB_ENV).map(PathBuf::from),
        );
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, addr: Option<String>, db_path: Option<PathBuf>) {
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        if let Some(path) = db_path {
            self.database.path = path;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.addr is not a socket address: {}",
                self.server.addr
            )));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("database.path".to_string()));
        }
        if self.inventory.location_qr_prefix.is_empty() || self.inventory.item_qr_prefix.is_empty()
        {
            return Err(ConfigError::MissingField(
                "inventory.*_qr_prefix".to_string(),
            ));
        }
        if self.inventory.location_qr_prefix == self.inventory.item_qr_prefix {
            return Err(ConfigError::Invalid(
                "location and item label prefixes must differ".to_string(),
            ));
        }
        if self.inventory.search_limit == 0 || self.inventory.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "inventory limits must be positive".to_string(),
            ));
        }
        if self.wardrobe.worn_basket_name.trim().is_empty()
            || self.wardrobe.dirty_basket_name.trim().is_empty()
        {
            return Err(ConfigError::MissingField("wardrobe basket name".to_string()));
        }
        Ok(())
    }
}

/// Configuration loading or validation error
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Missing field: {0}")]
    MissingField(String),
}
