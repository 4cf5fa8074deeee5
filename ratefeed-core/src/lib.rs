//! ratefeed core: fetch FX rates and a Bund yield, patch them into static tracker pages.
//!
//! This crate contains everything except argument parsing:
//! - Currency codes and the per-run rate mapping
//! - Refresh configuration (TOML, all fields defaulted)
//! - Quote and time-series fetchers behind `QuoteSource` / `YieldSource`
//! - Text patchers for the currency and bond artifacts
//! - The refresh driver with per-pipeline isolation and the run summary
//!
//! Everything runs sequentially on the calling thread. Artifacts are rewritten
//! with read-modify-write and no locking, so only one refresh may run against a
//! given pair of files at a time.

pub mod config;
pub mod currency;
pub mod driver;
pub mod fetch;
pub mod numeric;
pub mod patch;
pub mod progress;

pub use config::{ConfigError, RefreshConfig};
pub use currency::{CurrencyCode, RateMapping, UnknownCurrency};
pub use driver::{
    inspect_artifacts, run_refresh, run_refresh_with, Pipeline, PipelineResult, RefreshError,
    RunOutcome,
};
pub use fetch::{BundesbankYields, FetchError, QuoteSource, YahooQuotes, YieldSource};
pub use patch::{ArtifactStatus, PatchError, PatchOutcome, PatchReport};
pub use progress::{RefreshProgress, StdoutProgress};
