//! TOML configuration for the screener.
//!
//! Every key has a default, so an empty file (or no file) is a valid
//! configuration. Values are checked by `validate` after parsing.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use screener_core::catalog::{
    DirectorySource, SectorTable, UniverseSource, NASDAQ_LISTED_URL, OTHER_LISTED_URL,
};
use screener_core::data::yahoo::DEFAULT_USER_AGENT;
use screener_core::fetcher::MIN_LOOKBACK_DAYS;
use screener_core::{CatalogError, FetchSettings};

use crate::batch::{LoadOptions, RetryPolicy, MAX_BATCH, MAX_CONCURRENCY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenerConfig {
    pub fetch: FetchConfig,
    pub provider: ProviderConfig,
    pub universe: UniverseConfig,
    pub sectors: SectorsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Per-call deadline in seconds.
    pub timeout_secs: u64,
    /// Trading days of history requested per symbol.
    pub lookback_days: u32,
    pub max_batch: usize,
    /// 1 = sequential.
    pub concurrency: usize,
    /// Extra attempts for Timeout / Transport failures.
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub request_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            lookback_days: 100,
            max_batch: 20,
            concurrency: 1,
            max_retries: 0,
            retry_base_delay_ms: 500,
            request_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Where the symbol directories come from. A local path wins over the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniverseConfig {
    pub nasdaq_path: Option<PathBuf>,
    pub other_path: Option<PathBuf>,
    pub nasdaq_url: String,
    pub other_url: String,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            nasdaq_path: None,
            other_path: None,
            nasdaq_url: NASDAQ_LISTED_URL.to_string(),
            other_url: OTHER_LISTED_URL.to_string(),
        }
    }
}

impl UniverseConfig {
    pub fn source(&self) -> UniverseSource {
        let pick = |path: &Option<PathBuf>, url: &str| match path {
            Some(p) => DirectorySource::File(p.clone()),
            None => DirectorySource::Url(url.to_string()),
        };
        UniverseSource {
            nasdaq: pick(&self.nasdaq_path, &self.nasdaq_url),
            other: pick(&self.other_path, &self.other_url),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectorsConfig {
    /// JSON sector database; the built-in table when unset.
    pub database: Option<PathBuf>,
}

impl SectorsConfig {
    pub fn table(&self) -> Result<SectorTable, CatalogError> {
        match &self.database {
            Some(path) => SectorTable::from_file(path),
            None => Ok(SectorTable::builtin()),
        }
    }
}

impl ScreenerConfig {
    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.fetch;
        if f.timeout_secs == 0 {
            return Err(ConfigError::invalid("fetch.timeout_secs", "must be > 0"));
        }
        if f.lookback_days < MIN_LOOKBACK_DAYS {
            return Err(ConfigError::invalid(
                "fetch.lookback_days",
                format!("must be >= {MIN_LOOKBACK_DAYS}, got {}", f.lookback_days),
            ));
        }
        if !(1..=MAX_BATCH).contains(&f.max_batch) {
            return Err(ConfigError::invalid(
                "fetch.max_batch",
                format!("must be in 1..={MAX_BATCH}, got {}", f.max_batch),
            ));
        }
        if !(1..=MAX_CONCURRENCY).contains(&f.concurrency) {
            return Err(ConfigError::invalid(
                "fetch.concurrency",
                format!("must be in 1..={MAX_CONCURRENCY}, got {}", f.concurrency),
            ));
        }
        if self.provider.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("provider.user_agent", "must not be empty"));
        }
        Ok(())
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            lookback_days: self.fetch.lookback_days,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            concurrency: self.fetch.concurrency,
            retry: RetryPolicy {
                max_retries: self.fetch.max_retries,
                base_delay: Duration::from_millis(self.fetch.retry_base_delay_ms),
            },
            request_interval: Duration::from_millis(self.fetch.request_interval_ms),
        }
    }

    /// `fetch.max_batch`, or 1 if it was never validated and is zero.
    pub fn max_batch(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.fetch.max_batch).unwrap_or(NonZeroUsize::MIN)
    }
}
