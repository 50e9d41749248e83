use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::store::sha256_file;

/// Name of the file holding the captured error text.
pub const ERROR_TEXT_FILE: &str = "error.txt";

/// Captures files that failed to decode for later investigation.
///
/// Each failing file gets `<root>/<sha256>/` holding a copy of the file and an
/// `error.txt`. A second report for the same content is dropped.
#[derive(Debug, Clone)]
pub struct ErrorChannel {
    root: PathBuf,
}

impl ErrorChannel {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).with_context(|| {
            format!("Failed to create errors directory: {}", root.display())
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record `error` against `path`.
    ///
    /// Returns `false` when this content has already been reported.
    pub fn report(&self, path: &Path, error: &dyn Display) -> Result<bool> {
        let sha256 = sha256_file(path)?;
        let destination = self.root.join(&sha256);
        if destination.exists() {
            warn!("Ignoring duplicate failing file with shasum '{}'...", sha256);
            return Ok(false);
        }

        fs::create_dir_all(&destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        let file_name =
            path.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(&sha256));
        fs::copy(path, destination.join(file_name))
            .with_context(|| format!("Failed to copy failing file {}", path.display()))?;
        fs::write(destination.join(ERROR_TEXT_FILE), error.to_string())
            .with_context(|| format!("Failed to write error text for {}", path.display()))?;
        Ok(true)
    }

    /// Hashes of every file reported so far, sorted.
    pub fn reported(&self) -> Result<Vec<String>> {
        let mut hashes = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                hashes.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        hashes.sort();
        Ok(hashes)
    }
}
