//! Whole-file reads and atomic writes for tracker pages.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// I/O failure on an artifact that exists.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Full text of the artifact, or `None` if it does not exist.
pub fn read_artifact(path: &Path) -> Result<Option<String>, PatchError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PatchError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Replace the artifact's contents: write to `{name}.tmp`, then rename into place.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), PatchError> {
    let tmp_path = tmp_path_for(path);
    let write_err = |source| PatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    fs::write(&tmp_path, content).map_err(write_err)?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_err(e)
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".tmp");
    path.with_file_name(name)
}
