//! Archival sources.
//!
//! A source knows where its material lives locally, how to walk it, and how to
//! turn the walker's raw provenance chains into chains with download URLs.
//! Two kinds exist: Internet Archive items and website snapshots.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ProvenanceChain;

mod archive;
pub mod resolve;
mod snapshot;

pub use archive::ArchiveSource;
pub use resolve::{ArchiveResolver, ReferenceResolver, SnapshotResolver};
pub use snapshot::{SnapshotMetadata, SnapshotSource, SNAPSHOTS_BASE_URL};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unsupported source URL: {0}")]
    UnsupportedUrl(String),

    #[error("Source '{url}' has not been synced: {path} is missing")]
    NotSynced { url: String, path: PathBuf },

    #[error("Invalid source metadata at {path}: {message}")]
    InvalidMetadata { path: PathBuf, message: String },
}

/// Lazy sequence of discovered files with resolved provenance.
pub type Assets<'a> = Box<dyn Iterator<Item = (PathBuf, ProvenanceChain)> + 'a>;

/// Entry written to `sources.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub html_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

pub trait Source {
    /// The URL this source was created from.
    fn url(&self) -> &str;

    /// Local path that `assets` walks.
    fn path(&self) -> &Path;

    /// Materialize local copies of the source material.
    fn sync(&self) -> Result<()>;

    /// Every file reachable from the source, with resolved references.
    fn assets(&self) -> Result<Assets<'_>>;

    fn describe(&self) -> Result<SourceDescription>;
}

/// Pick the source kind for `url`.
pub fn create_source(assets_dir: &Path, url: &str) -> Result<Box<dyn Source>, SourceError> {
    let parsed = url::Url::parse(url).map_err(|_| SourceError::UnsupportedUrl(url.to_string()))?;
    if parsed.host_str() == Some(archive::ARCHIVE_HOST) {
        return Ok(Box::new(ArchiveSource::new(assets_dir, url)?));
    }
    if url.starts_with(SNAPSHOTS_BASE_URL) {
        return Ok(Box::new(SnapshotSource::new(assets_dir, url)?));
    }
    Err(SourceError::UnsupportedUrl(url.to_string()))
}
