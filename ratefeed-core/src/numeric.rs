//! Rounding and number rendering shared by the fetchers and patchers.

/// Decimal places kept for FX rates.
pub const RATE_DECIMALS: u32 = 6;

/// Decimal places kept for the bond yield.
pub const YIELD_DECIMALS: u32 = 2;

/// Round to `decimals` places using the exact decimal value of the `f64`.
///
/// `2.675` is stored as `2.67499999...`, so it rounds to `2.67`. Rounding an
/// already-rounded value returns the same `f64`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    format!("{value:.prec$}", prec = decimals as usize)
        .parse()
        .unwrap_or(value)
}

/// Render a value the way it is written into the page script.
///
/// Uses the shortest round-trip representation and always keeps a decimal
/// point, so `1.0` stays `1.0` rather than `1`.
pub fn render_number(value: f64) -> String {
    format!("{value:?}")
}
