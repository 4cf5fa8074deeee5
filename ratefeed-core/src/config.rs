//! Refresh configuration.
//!
//! Every field has a default matching the live tracker pages, so an empty (or
//! absent) TOML file is a valid configuration. A partial file overrides only
//! the keys it names:
//!
//! ```toml
//! currencies = ["EUR", "GBP"]
//! currency_file = "site/currency-tracker.html"
//! quote_timeout_secs = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::currency::CurrencyCode;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Immutable settings for one refresh run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshConfig {
    /// Codes to fetch. The rate block is always rendered in canonical order.
    pub currencies: Vec<CurrencyCode>,
    /// Artifact holding `const CURRENT = { ... };`.
    pub currency_file: PathBuf,
    /// Artifact holding `const CURRENT_YIELD = <number>;`.
    pub bond_file: PathBuf,
    /// Scheme and host of the quote service.
    pub quote_base_url: String,
    pub user_agent: String,
    pub quote_timeout_secs: u64,
    /// Full URL of the 10-year Bund yield series.
    pub yield_url: String,
    /// Key of the series inside `data.dataSets[0].series`.
    pub yield_series_key: String,
    pub yield_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            currencies: CurrencyCode::ALL.to_vec(),
            currency_file: PathBuf::from("february-2026-currency-tracker.html"),
            bond_file: PathBuf::from("german-bond-tracker.html"),
            quote_base_url: "https://query1.finance.yahoo.com".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            quote_timeout_secs: 10,
            yield_url: "https://api.statistiken.bundesbank.de/rest/data/BBSSY/D.REN.EUR.A630.000000WT1010.A"
                .to_string(),
            yield_series_key: "0:0:0:0:0:0".to_string(),
            yield_timeout_secs: 15,
        }
    }
}

impl RefreshConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve relative artifact paths against `dir`. Absolute paths are kept.
    pub fn rooted_at(mut self, dir: &Path) -> Self {
        self.currency_file = dir.join(&self.currency_file);
        self.bond_file = dir.join(&self.bond_file);
        self
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_secs(self.quote_timeout_secs)
    }

    pub fn yield_timeout(&self) -> Duration {
        Duration::from_secs(self.yield_timeout_secs)
    }
}
