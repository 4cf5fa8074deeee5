//! Currency codes and the transient code → price mapping built once per run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The eight currencies quoted against USD.
///
/// Variant order is the canonical order used when rendering the rate block,
/// so `Ord` and `ALL` must stay in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Eur,
    Gbp,
    Jpy,
    Cny,
    Chf,
    Aud,
    Cad,
    Mxn,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 8] = [
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Jpy,
        CurrencyCode::Cny,
        CurrencyCode::Chf,
        CurrencyCode::Aud,
        CurrencyCode::Cad,
        CurrencyCode::Mxn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Cny => "CNY",
            CurrencyCode::Chf => "CHF",
            CurrencyCode::Aud => "AUD",
            CurrencyCode::Cad => "CAD",
            CurrencyCode::Mxn => "MXN",
        }
    }

    /// Quote-service symbol for this code against USD, e.g. `EURUSD=X`.
    pub fn quote_symbol(self) -> String {
        format!("{}USD=X", self.as_str())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown currency code '{0}' (expected one of EUR, GBP, JPY, CNY, CHF, AUD, CAD, MXN)")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        CurrencyCode::ALL
            .into_iter()
            .find(|code| code.as_str() == upper)
            .ok_or_else(|| UnknownCurrency(s.to_string()))
    }
}

/// Rates that were fetched successfully this run. Failed codes are simply absent.
///
/// Backed by a `BTreeMap` keyed on `CurrencyCode`, so iteration is always in
/// canonical order regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateMapping {
    rates: BTreeMap<CurrencyCode, f64>,
}

impl RateMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: CurrencyCode, price: f64) {
        self.rates.insert(code, price);
    }

    pub fn get(&self, code: CurrencyCode) -> Option<f64> {
        self.rates.get(&code).copied()
    }

    pub fn contains(&self, code: CurrencyCode) -> bool {
        self.rates.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Present rates in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CurrencyCode, f64)> + '_ {
        self.rates.iter().map(|(code, price)| (*code, *price))
    }
}

impl FromIterator<(CurrencyCode, f64)> for RateMapping {
    fn from_iter<I: IntoIterator<Item = (CurrencyCode, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}
