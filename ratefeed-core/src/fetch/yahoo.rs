//! Yahoo Finance quote source.
//!
//! Reads the spot price from the v8 chart endpoint's `meta` block; the bar
//! arrays in the same response are ignored.

use reqwest::blocking::{Client, ClientBuilder};
use serde::Deserialize;
use tracing::debug;

use super::{finite, FetchError, QuoteSource};
use crate::config::RefreshConfig;
use crate::currency::CurrencyCode;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

/// Blocking client for the chart API, one request per currency.
pub struct YahooQuotes {
    client: Client,
    base_url: String,
}

impl YahooQuotes {
    pub fn new(config: &RefreshConfig) -> Result<Self, FetchError> {
        Self::with_builder(config, Client::builder())
    }

    fn with_builder(config: &RefreshConfig, builder: ClientBuilder) -> Result<Self, FetchError> {
        let client = builder
            .timeout(config.quote_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.quote_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, code: CurrencyCode) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, code.quote_symbol())
    }
}

impl QuoteSource for YahooQuotes {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn quote(&self, code: CurrencyCode) -> Result<f64, FetchError> {
        let url = self.chart_url(code);
        debug!(%url, "requesting quote");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;
        parse_quote(code, &body)
    }
}

/// Extract `chart.result[0].meta.regularMarketPrice` from a chart response body.
pub fn parse_quote(code: CurrencyCode, body: &str) -> Result<f64, FetchError> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::ResponseFormatChanged(format!("failed to parse chart for {code}: {e}"))
    })?;

    let results = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) => FetchError::ResponseFormatChanged(format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_default()
        )),
        None => FetchError::ResponseFormatChanged("empty result with no error".into()),
    })?;

    let data = results
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::ResponseFormatChanged("result array is empty".into()))?;

    let price = data
        .meta
        .regular_market_price
        .ok_or_else(|| FetchError::ResponseFormatChanged("no regularMarketPrice".into()))?;

    finite(price, code.as_str())
}
