//! Patcher for the bond tracker's `const CURRENT_YIELD = <number>;` statement.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::path::Path;

use super::timestamp::{format_timestamp, replace_timestamp};
use super::{inspect_artifact, patch_artifact, ArtifactStatus, PatchError, PatchOutcome, Patched};
use crate::numeric::render_number;

// Optional sign so a negative yield written by one run still matches on the next.
static YIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"const CURRENT_YIELD = -?[\d.]+;").expect("yield pattern is valid")
});

const STATEMENT_PREFIX: &str = "const CURRENT_YIELD = ";

pub fn render_yield_statement(value: f64) -> String {
    format!("{STATEMENT_PREFIX}{};", render_number(value))
}

pub(crate) fn has_yield_statement(text: &str) -> bool {
    YIELD_RE.is_match(text)
}

pub(crate) fn apply_yield(text: &str, value: f64, stamp: &str) -> Patched {
    let statement = render_yield_statement(value);
    let block_replaced = has_yield_statement(text);
    let with_yield = YIELD_RE.replace(text, NoExpand(&statement));
    let (text, timestamp_replaced) = replace_timestamp(&with_yield, stamp);
    Patched {
        text,
        block_replaced,
        timestamp_replaced,
    }
}

/// Rewrite the yield statement and `lastUpdated` span of the bond page.
///
/// A missing file is `PatchOutcome::Missing`, not an error.
pub fn patch_bond_file(
    path: &Path,
    value: f64,
    now: DateTime<Utc>,
) -> Result<PatchOutcome, PatchError> {
    let stamp = format_timestamp(now);
    patch_artifact(path, STATEMENT_PREFIX.trim_end(), |text| {
        apply_yield(text, value, &stamp)
    })
}

/// Report whether the bond page carries both markers.
pub fn inspect_bond_file(path: &Path) -> Result<ArtifactStatus, PatchError> {
    inspect_artifact(path, has_yield_statement)
}
