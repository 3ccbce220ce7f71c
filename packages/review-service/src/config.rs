//! Service configuration (YAML)
//!
//! ```yaml
//! database:
//!   path: ./reviews.db        # omit for an in-memory database
//! cache:
//!   max_entries: 10000
//!   ttl_secs: 3600
//!   fetch_timeout_ms: 10000
//! search:
//!   index: review
//! id_generator:
//!   start_date: "2024-01-01"
//!   machine_id: 1
//! paging:
//!   default_size: 10
//!   max_size: 50
//! ```
//!
//! Every section is optional; missing fields take the defaults above.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub ttl_secs: u64,
    pub fetch_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl_secs: 3600,
            fetch_timeout_ms: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub index: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index: "review".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdGeneratorConfig {
    /// `YYYY-MM-DD`
    pub start_date: String,
    pub machine_id: i64,
}

impl Default for IdGeneratorConfig {
    fn default() -> Self {
        Self {
            start_date: "2024-01-01".to_string(),
            machine_id: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagingConfig {
    pub default_size: usize,
    pub max_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_size: 10,
            max_size: 50,
        }
    }
}

impl PagingConfig {
    /// Page number and size into `(offset, limit)`
    ///
    /// `page < 1` becomes 1; a size outside `(0, max_size]` becomes
    /// `default_size`. An offset past `usize::MAX` saturates, which lands
    /// beyond every result set.
    pub fn normalize(&self, page: i64, size: i64) -> (usize, usize) {
        let page = usize::try_from(page.max(1)).unwrap_or(usize::MAX);
        let size = match usize::try_from(size) {
            Ok(size) if size > 0 && size <= self.max_size => size,
            _ => self.default_size,
        };
        ((page - 1).saturating_mul(size), size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub id_generator: IdGeneratorConfig,
    pub paging: PagingConfig,
}

impl ServiceConfig {
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: ServiceConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.cache.max_entries == 0 {
            return Err(invalid("cache.max_entries", "must be positive"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", "must be positive"));
        }
        if self.cache.fetch_timeout_ms == 0 {
            return Err(invalid("cache.fetch_timeout_ms", "must be positive"));
        }
        if self.search.index.is_empty() || self.search.index.contains(':') {
            return Err(invalid(
                "search.index",
                "must be non-empty and must not contain ':'",
            ));
        }
        if !(1..=1023).contains(&self.id_generator.machine_id) {
            return Err(invalid(
                "id_generator.machine_id",
                format!("{} not in 1..=1023", self.id_generator.machine_id),
            ));
        }
        if self.paging.max_size == 0 {
            return Err(invalid("paging.max_size", "must be positive"));
        }
        if self.paging.default_size == 0 || self.paging.default_size > self.paging.max_size {
            return Err(invalid(
                "paging.default_size",
                format!("must be in 1..={}", self.paging.max_size),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
