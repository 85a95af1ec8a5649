//! Shop settings loading from config.toml
//!
//! The configured shop is seeded into the database at startup. Its timezone decides
//! what "today" means for every due-date label and priority sort.

use crate::core::dates::parse_timezone;
use crate::errors::{Error, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// The shop this deployment serves
    pub shop: ShopConfig,
    /// Cache tuning
    #[serde(default)]
    pub cache: CacheConfig,
}

/// The `[shop]` table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    /// Display name; also the natural key used when seeding
    pub name: String,
    /// IANA timezone name (e.g. `"America/Chicago"`)
    pub timezone: String,
    /// Sales tax in basis points (825 = 8.25%)
    #[serde(default)]
    pub tax_rate_bps: i32,
}

impl ShopConfig {
    /// Parsed timezone.
    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }
}

/// The `[cache]` table
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of cached garment lists
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

const fn default_ttl_seconds() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    /// TTL as a `Duration`.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Parses and validates config.toml contents.
///
/// # Errors
/// Returns an error if:
/// - The TOML syntax is invalid
/// - Required fields are missing
/// - The timezone is not a known IANA zone, or the tax rate is negative
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.shop.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Shop name cannot be empty".to_string(),
        });
    }
    config.shop.tz()?;
    if config.shop.tax_rate_bps < 0 {
        return Err(Error::Config {
            message: format!("Tax rate cannot be negative: {}", config.shop.tax_rate_bps),
        });
    }

    Ok(config)
}

/// Loads shop configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    tracing::debug!("Loading configuration from {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `THREADLINE_CONFIG`, or ./config.toml when unset.
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("THREADLINE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
