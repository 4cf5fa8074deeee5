//! Patcher for the currency tracker's `const CURRENT = { ... };` block.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::path::Path;

use super::timestamp::{format_timestamp, replace_timestamp};
use super::{inspect_artifact, patch_artifact, ArtifactStatus, PatchError, PatchOutcome, Patched};
use crate::currency::RateMapping;
use crate::numeric::render_number;

// The block holds no nested braces, so scanning to the first `}` is enough.
static RATE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"const CURRENT = \{[^}]+\};").expect("rate block pattern is valid"));

const BLOCK_OPEN: &str = "const CURRENT = {";
const BLOCK_CLOSE: &str = "        };";
const ENTRY_INDENT: &str = "            ";

/// Render the replacement block: present codes only, in canonical order.
///
/// ```text
/// const CURRENT = {
///             EUR: 0.923456,
///             GBP: 0.791234
///         };
/// ```
pub fn render_rate_block(rates: &RateMapping) -> String {
    let entries: Vec<String> = rates
        .iter()
        .map(|(code, price)| format!("{ENTRY_INDENT}{code}: {}", render_number(price)))
        .collect();

    if entries.is_empty() {
        format!("{BLOCK_OPEN}\n{BLOCK_CLOSE}")
    } else {
        format!("{BLOCK_OPEN}\n{}\n{BLOCK_CLOSE}", entries.join(",\n"))
    }
}

pub(crate) fn has_rate_block(text: &str) -> bool {
    RATE_BLOCK_RE.is_match(text)
}

/// Apply the rate block and timestamp substitutions to page text.
pub(crate) fn apply_rates(text: &str, rates: &RateMapping, stamp: &str) -> Patched {
    let block = render_rate_block(rates);
    let block_replaced = has_rate_block(text);
    let with_block = RATE_BLOCK_RE.replace(text, NoExpand(&block));
    let (text, timestamp_replaced) = replace_timestamp(&with_block, stamp);
    Patched {
        text,
        block_replaced,
        timestamp_replaced,
    }
}

/// Rewrite the rate block and `lastUpdated` span of the currency page.
///
/// A missing file is `PatchOutcome::Missing`, not an error.
pub fn patch_currency_file(
    path: &Path,
    rates: &RateMapping,
    now: DateTime<Utc>,
) -> Result<PatchOutcome, PatchError> {
    let stamp = format_timestamp(now);
    patch_artifact(path, BLOCK_OPEN, |text| apply_rates(text, rates, &stamp))
}

/// Report whether the currency page carries both markers.
pub fn inspect_currency_file(path: &Path) -> Result<ArtifactStatus, PatchError> {
    inspect_artifact(path, has_rate_block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyCode;

    const PAGE: &str = r#"<html><body>
<p>Last updated: <span id="lastUpdated">January 01, 2026 at 09:00 AM GMT</span></p>
<script>
        const CURRENT = {
            EUR: 0.91,
            GBP: 0.78,
            JPY: 0.0066
        };
        const TARGETS = { EUR: 0.95 };
</script>
</body></html>"#;

    fn two_rates() -> RateMapping {
        [(CurrencyCode::Gbp, 0.791234), (CurrencyCode::Eur, 0.923456)]
            .into_iter()
            .collect()
    }

    #[test]
    fn block_lists_present_codes_without_trailing_comma() {
        assert_eq!(
            render_rate_block(&two_rates()),
            "const CURRENT = {\n            EUR: 0.923456,\n            GBP: 0.791234\n        };"
        );
    }

    #[test]
    fn empty_block_has_no_entries() {
        assert_eq!(
            render_rate_block(&RateMapping::new()),
            "const CURRENT = {\n        };"
        );
    }

    #[test]
    fn whole_numbers_keep_decimal_point() {
        let rates: RateMapping = [(CurrencyCode::Chf, 1.0)].into_iter().collect();
        assert!(render_rate_block(&rates).contains("CHF: 1.0\n"));
    }

    #[test]
    fn apply_touches_only_matched_regions() {
        let patched = apply_rates(PAGE, &two_rates(), "STAMP");
        assert!(patched.block_replaced);
        assert!(patched.timestamp_replaced);

        let expected = PAGE
            .replace(
                "const CURRENT = {\n            EUR: 0.91,\n            GBP: 0.78,\n            JPY: 0.0066\n        };",
                "const CURRENT = {\n            EUR: 0.923456,\n            GBP: 0.791234\n        };",
            )
            .replace("January 01, 2026 at 09:00 AM GMT", "STAMP");
        assert_eq!(patched.text, expected);
        assert!(patched.text.contains("const TARGETS = { EUR: 0.95 };"));
    }

    #[test]
    fn missing_block_still_updates_timestamp() {
        let page = r#"<span id="lastUpdated">old</span><script>const RATES = {};</script>"#;
        let patched = apply_rates(page, &two_rates(), "new");
        assert!(!patched.block_replaced);
        assert!(patched.timestamp_replaced);
        assert_eq!(
            patched.text,
            r#"<span id="lastUpdated">new</span><script>const RATES = {};</script>"#
        );
    }

    #[test]
    fn empty_mapping_patch_can_be_reapplied() {
        let once = apply_rates(PAGE, &RateMapping::new(), "T").text;
        let twice = apply_rates(&once, &two_rates(), "T");
        assert!(twice.block_replaced);
        assert!(twice.text.contains("EUR: 0.923456"));
    }
}
