//! The `lastUpdated` span shared by both pages.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(<span[^>]*id="lastUpdated"[^>]*>)[^<]*(</span>)"#)
        .expect("timestamp pattern is valid")
});

/// Format as `February 07, 2026 at 03:05 PM GMT`.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%B %d, %Y at %I:%M %p GMT").to_string()
}

pub(crate) fn has_timestamp_marker(text: &str) -> bool {
    TIMESTAMP_RE.is_match(text)
}

/// Replace the inner text of the first `lastUpdated` span.
///
/// Returns the new text and whether the marker matched.
pub(crate) fn replace_timestamp(text: &str, stamp: &str) -> (String, bool) {
    let mut matched = false;
    let replaced = TIMESTAMP_RE.replace(text, |caps: &Captures<'_>| {
        matched = true;
        format!("{}{stamp}{}", &caps[1], &caps[2])
    });
    (replaced.into_owned(), matched)
}
