use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use curator_core::library::LibraryContext;
use tracing::debug;

use crate::canonicalize_or_current;

/// Resolve `--library` and load the definition with its sources.
pub fn open_library(library: &str) -> Result<(PathBuf, LibraryContext)> {
    let path = canonicalize_or_current(library)?;
    debug!("Opening library at {}", path.display());
    let ctx = LibraryContext::from_path(&path)
        .with_context(|| format!("Failed to open library at {}", path.display()))?;
    Ok((path, ctx))
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}
