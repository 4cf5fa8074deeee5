//! Bundesbank time-series source for the 10-year Bund yield.
//!
//! The SDMX-JSON body nests observations as
//! `data.dataSets[0].series["0:0:0:0:0:0"].observations`, a map from string
//! ordinals ("0", "1", ..., "10", ...) to arrays whose first element is the
//! value. Higher ordinals are more recent.

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use tracing::debug;

use super::{finite, FetchError, YieldSource};
use crate::config::RefreshConfig;

/// Blocking client for a single Bundesbank series.
pub struct BundesbankYields {
    client: Client,
    url: String,
    series_key: String,
}

impl BundesbankYields {
    pub fn new(config: &RefreshConfig) -> Result<Self, FetchError> {
        Self::with_builder(config, Client::builder())
    }

    fn with_builder(config: &RefreshConfig, builder: ClientBuilder) -> Result<Self, FetchError> {
        let client = builder
            .timeout(config.yield_timeout())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.yield_url.clone(),
            series_key: config.yield_series_key.clone(),
        })
    }
}

impl YieldSource for BundesbankYields {
    fn name(&self) -> &str {
        "bundesbank"
    }

    fn latest_yield(&self) -> Result<f64, FetchError> {
        debug!(url = %self.url, "requesting yield series");

        let resp = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;
        parse_latest_yield(&body, &self.series_key)
    }
}

/// Pull the most recent observation value out of an SDMX-JSON body.
pub fn parse_latest_yield(body: &str, series_key: &str) -> Result<f64, FetchError> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::ResponseFormatChanged(format!("failed to parse series: {e}")))?;

    let observations = observations(&root, series_key)?;
    let key = latest_ordinal(observations.keys().map(String::as_str))?
        .ok_or_else(|| FetchError::NoObservations(series_key.to_string()))?;

    let first = observations[key]
        .as_array()
        .and_then(|values| values.first())
        .ok_or_else(|| {
            FetchError::ResponseFormatChanged(format!("observation {key} is not a non-empty array"))
        })?;

    numeric_value(first).and_then(|v| finite(v, series_key))
}

fn observations<'a>(root: &'a Value, series_key: &str) -> Result<&'a Map<String, Value>, FetchError> {
    let pointer = format!(
        "/data/dataSets/0/series/{}/observations",
        escape_pointer_token(series_key)
    );
    root.pointer(&pointer)
        .and_then(Value::as_object)
        .ok_or_else(|| FetchError::ResponseFormatChanged(format!("no observations at {pointer}")))
}

/// RFC 6901 escaping for a single reference token.
fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Pick the key with the greatest integer value ("10" beats "9").
///
/// Returns `Ok(None)` for an empty key set and an error if any key is not an
/// unsigned integer.
pub fn latest_ordinal<'a, I>(keys: I) -> Result<Option<&'a str>, FetchError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(u64, &'a str)> = None;
    for key in keys {
        let ordinal: u64 = key.trim().parse().map_err(|_| {
            FetchError::ResponseFormatChanged(format!("observation key '{key}' is not an ordinal"))
        })?;
        if best.map_or(true, |(max, _)| ordinal > max) {
            best = Some((ordinal, key));
        }
    }
    Ok(best.map(|(_, key)| key))
}

/// Observation values arrive as JSON numbers or numeric strings.
fn numeric_value(value: &Value) -> Result<f64, FetchError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| FetchError::NonNumeric(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| FetchError::NonNumeric(s.clone())),
        other => Err(FetchError::NonNumeric(other.to_string())),
    }
}
