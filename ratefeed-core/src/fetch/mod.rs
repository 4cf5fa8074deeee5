//! Fetchers for FX quotes and the Bund yield.
//!
//! Network access sits behind the `QuoteSource` and `YieldSource` traits so
//! the driver can be exercised with in-memory sources. Sources return raw
//! values and typed errors; `fetch_rates` / `fetch_yield` round the values and
//! turn every error into absence, logging the reason.

pub mod bundesbank;
pub mod yahoo;

pub use bundesbank::BundesbankYields;
pub use yahoo::YahooQuotes;

use thiserror::Error;
use tracing::warn;

use crate::currency::{CurrencyCode, RateMapping};
use crate::numeric::{round_to, RATE_DECIMALS, YIELD_DECIMALS};
use crate::progress::RefreshProgress;

/// Why a single fetch produced no value.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("non-numeric value: {0}")]
    NonNumeric(String),

    #[error("series '{0}' has no observations")]
    NoObservations(String),
}

/// A service that quotes one currency against USD.
pub trait QuoteSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Current price of one unit of `code` in USD, unrounded.
    fn quote(&self, code: CurrencyCode) -> Result<f64, FetchError>;
}

/// A service that reports the most recent bond yield.
pub trait YieldSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Most recent observation, unrounded.
    fn latest_yield(&self) -> Result<f64, FetchError>;
}

impl<T: QuoteSource + ?Sized> QuoteSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn quote(&self, code: CurrencyCode) -> Result<f64, FetchError> {
        (**self).quote(code)
    }
}

impl<T: YieldSource + ?Sized> YieldSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn latest_yield(&self) -> Result<f64, FetchError> {
        (**self).latest_yield()
    }
}

/// Quote every code independently. Failed codes are left out of the mapping.
pub fn fetch_rates(
    source: &dyn QuoteSource,
    codes: &[CurrencyCode],
    progress: &dyn RefreshProgress,
) -> RateMapping {
    let mut rates = RateMapping::new();
    for &code in codes {
        let result = source
            .quote(code)
            .map(|price| round_to(price, RATE_DECIMALS));
        progress.on_quote(code, &result);
        match result {
            Ok(price) => rates.insert(code, price),
            Err(e) => warn!(source = source.name(), %code, error = %e, "quote failed"),
        }
    }
    rates
}

/// Fetch the yield once, rounded to two places, or `None` on any failure.
pub fn fetch_yield(source: &dyn YieldSource) -> Option<f64> {
    match source.latest_yield() {
        Ok(value) => Some(round_to(value, YIELD_DECIMALS)),
        Err(e) => {
            warn!(source = source.name(), error = %e, "yield fetch failed");
            None
        }
    }
}

/// Accept only finite numbers. JSON numbers are never NaN or infinite, but a
/// numeric string such as `"NaN"` or `"inf"` parses to one.
pub(crate) fn finite(value: f64, context: &str) -> Result<f64, FetchError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FetchError::NonNumeric(format!("{context}: {value}")))
    }
}
