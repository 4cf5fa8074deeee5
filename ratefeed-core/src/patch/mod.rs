//! In-place text patchers for the tracker pages.
//!
//! Each artifact carries two markers: an assignment (the rate block or the
//! yield statement) and the `lastUpdated` span. Patching is plain regex
//! substitution on the first match of each marker; nothing outside the two
//! matched regions is touched and the surrounding markup is never parsed.
//!
//! A marker that does not match is not an error: the other substitution still
//! happens, the file is still written, and the miss is logged and recorded in
//! the returned `PatchReport`.
//!
//! Writes go to a sibling `.tmp` file that is renamed over the artifact, so a
//! concurrent reader sees either the old or the new page. There is no locking;
//! two refreshes racing on the same artifact can lose an update.

pub mod artifact;
pub mod bond;
pub mod currency;
pub mod timestamp;

pub use artifact::PatchError;
pub use bond::{inspect_bond_file, patch_bond_file, render_yield_statement};
pub use currency::{inspect_currency_file, patch_currency_file, render_rate_block};
pub use timestamp::format_timestamp;

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a patch did to an existing artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub path: PathBuf,
    /// The assignment marker matched and was replaced.
    pub block_replaced: bool,
    /// The `lastUpdated` span matched and was replaced.
    pub timestamp_replaced: bool,
}

impl PatchReport {
    /// Both markers matched.
    pub fn is_complete(&self) -> bool {
        self.block_replaced && self.timestamp_replaced
    }
}

/// Result of patching one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The artifact does not exist; nothing was read or written.
    Missing,
    /// The artifact was read, patched, and written back.
    Updated(PatchReport),
}

impl PatchOutcome {
    /// Whether the file existed and was processed.
    pub fn is_updated(&self) -> bool {
        matches!(self, PatchOutcome::Updated(_))
    }
}

/// Marker presence in an artifact, without modifying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Missing,
    Present { assignment: bool, timestamp: bool },
}

impl ArtifactStatus {
    /// True unless the file exists and lacks a marker.
    pub fn is_patchable(&self) -> bool {
        match self {
            ArtifactStatus::Missing => true,
            ArtifactStatus::Present {
                assignment,
                timestamp,
            } => *assignment && *timestamp,
        }
    }
}

/// Text after substitution plus which markers matched.
pub(crate) struct Patched {
    pub text: String,
    pub block_replaced: bool,
    pub timestamp_replaced: bool,
}

/// Read-modify-write shared by both patchers.
pub(crate) fn patch_artifact<F>(path: &Path, marker: &str, apply: F) -> Result<PatchOutcome, PatchError>
where
    F: FnOnce(&str) -> Patched,
{
    let Some(original) = artifact::read_artifact(path)? else {
        warn!(path = %path.display(), "artifact not found, skipping patch");
        return Ok(PatchOutcome::Missing);
    };

    let patched = apply(&original);
    if !patched.block_replaced {
        warn!(path = %path.display(), marker, "assignment marker not found");
    }
    if !patched.timestamp_replaced {
        warn!(path = %path.display(), "lastUpdated marker not found");
    }

    artifact::write_atomic(path, &patched.text)?;
    info!(path = %path.display(), "artifact updated");

    Ok(PatchOutcome::Updated(PatchReport {
        path: path.to_path_buf(),
        block_replaced: patched.block_replaced,
        timestamp_replaced: patched.timestamp_replaced,
    }))
}

/// Check an artifact for both markers using `has_assignment`.
pub(crate) fn inspect_artifact(
    path: &Path,
    has_assignment: fn(&str) -> bool,
) -> Result<ArtifactStatus, PatchError> {
    Ok(match artifact::read_artifact(path)? {
        None => ArtifactStatus::Missing,
        Some(text) => ArtifactStatus::Present {
            assignment: has_assignment(&text),
            timestamp: timestamp::has_timestamp_marker(&text),
        },
    })
}
