//! # Application Configuration
//!
//! Settings for the database, pick-time estimates, quotations and orders.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KEYSTONE_DB_PATH=/srv/keystone/keystone.db                         │
//! │     KEYSTONE_PICK_BASE_SECONDS=45                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/keystone/keystone.toml (Linux)                           │
//! │     ~/Library/Application Support/com.keystone.workshop/keystone.toml  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/keystone/keystone.db"
//! max_connections = 5
//!
//! [picking]
//! base_seconds_per_line = 60
//! seconds_per_additional_unit = 5
//!
//! [quotations]
//! validity_days = 30
//! number_prefix = "Q"
//!
//! [orders]
//! number_prefix = "SO"
//! default_warehouse = "Main"
//! ```

use directories::ProjectDirs;
use keystone_core::{PickTimeConfig, DEFAULT_QUOTATION_VALIDITY_DAYS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "keystone.toml";

/// Database file name inside the platform data directory.
pub const DATABASE_FILE_NAME: &str = "keystone.db";

/// Upper bound for either pick-time setting, in seconds.
pub const MAX_PICK_SECONDS: u64 = 3600;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationSettings {
    /// Days from creation until a quotation expires.
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,

    /// `Q` gives numbers like `Q-20260301-0004`.
    #[serde(default = "default_quotation_prefix")]
    pub number_prefix: String,
}

fn default_validity_days() -> u32 {
    DEFAULT_QUOTATION_VALIDITY_DAYS
}

fn default_quotation_prefix() -> String {
    "Q".to_string()
}

impl Default for QuotationSettings {
    fn default() -> Self {
        QuotationSettings {
            validity_days: default_validity_days(),
            number_prefix: default_quotation_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettings {
    #[serde(default = "default_order_prefix")]
    pub number_prefix: String,

    /// Pre-assigned to converted orders; staff can still change it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_warehouse: Option<String>,
}

fn default_order_prefix() -> String {
    "SO".to_string()
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            number_prefix: default_order_prefix(),
            default_warehouse: None,
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub picking: PickTimeConfig,

    #[serde(default)]
    pub quotations: QuotationSettings,

    #[serde(default)]
    pub orders: OrderSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, or the platform default)
    /// 3. `KEYSTONE_*` environment variables
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks the values the rest of the app relies on.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if !(1..=MAX_PICK_SECONDS).contains(&self.picking.base_seconds_per_line) {
            return Err(ConfigError::Invalid(format!(
                "picking.base_seconds_per_line must be between 1 and {}, got {}",
                MAX_PICK_SECONDS, self.picking.base_seconds_per_line
            )));
        }

        if self.picking.seconds_per_additional_unit > MAX_PICK_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "picking.seconds_per_additional_unit must be at most {}, got {}",
                MAX_PICK_SECONDS, self.picking.seconds_per_additional_unit
            )));
        }

        if !(1..=365).contains(&self.quotations.validity_days) {
            return Err(ConfigError::Invalid(format!(
                "quotations.validity_days must be between 1 and 365, got {}",
                self.quotations.validity_days
            )));
        }

        validate_prefix("quotations.number_prefix", &self.quotations.number_prefix)?;
        validate_prefix("orders.number_prefix", &self.orders.number_prefix)?;

        if self.quotations.number_prefix == self.orders.number_prefix {
            return Err(ConfigError::Invalid(
                "quotation and order number prefixes must differ".into(),
            ));
        }

        if let Some(warehouse) = &self.orders.default_warehouse {
            if warehouse.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "orders.default_warehouse must not be blank".into(),
                ));
            }
        }

        Ok(())
    }

    /// Applies `KEYSTONE_*` overrides read through `var`.
    ///
    /// Unparseable numbers are logged and ignored.
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("KEYSTONE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(secs) = parse_env(&var, "KEYSTONE_PICK_BASE_SECONDS") {
            self.picking.base_seconds_per_line = secs;
        }

        if let Some(secs) = parse_env(&var, "KEYSTONE_PICK_UNIT_SECONDS") {
            self.picking.seconds_per_additional_unit = secs;
        }

        if let Some(days) = parse_env(&var, "KEYSTONE_QUOTATION_VALIDITY_DAYS") {
            self.quotations.validity_days = days;
        }

        if let Some(warehouse) = var("KEYSTONE_WAREHOUSE") {
            debug!(warehouse = %warehouse, "Overriding default warehouse from environment");
            self.orders.default_warehouse = Some(warehouse);
        }
    }

    /// Database file to open: the configured path, else the platform data
    /// directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }

        project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }

    /// Platform config file location.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "keystone", "workshop")
}

fn parse_env<F, T>(var: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => {
            debug!(key, value = %raw, "Overriding from environment");
            Some(value)
        }
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

fn validate_prefix(field: &str, prefix: &str) -> ConfigResult<()> {
    if prefix.is_empty() || prefix.len() > 8 || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be 1-8 letters or digits, got '{prefix}'"
        )));
    }
    Ok(())
}
