use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::containers::extract::extract_tar_gz;
use crate::containers::walk;
use crate::model::ReferenceItem;
use crate::sources::resolve::{ReferenceResolver, SnapshotResolver};
use crate::sources::{Assets, Source, SourceDescription, SourceError};

/// Bucket holding published website snapshots.
pub const SNAPSHOTS_BASE_URL: &str =
    "https://f002.backblazeb2.com/file/psion-software-index-snapshots/";

const SNAPSHOT_SUFFIX: &str = ".tar.gz";

/// `metadata.json` shipped inside every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Original address of the mirrored site.
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// A mirrored copy of a website, packed as `contents.tar.gz` plus metadata.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    url: String,
    identifier: String,
    file_name: String,
    downloads_dir: PathBuf,
    path: PathBuf,
    contents_path: PathBuf,
    metadata_path: PathBuf,
}

impl SnapshotSource {
    pub fn new(assets_dir: &Path, url: &str) -> Result<Self, SourceError> {
        let unsupported = || SourceError::UnsupportedUrl(url.to_string());
        if !url.starts_with(SNAPSHOTS_BASE_URL) || !url.ends_with(SNAPSHOT_SUFFIX) {
            return Err(unsupported());
        }
        let file_name = url.rsplit('/').next().ok_or_else(unsupported)?.to_string();
        let basename = &file_name[..file_name.len() - SNAPSHOT_SUFFIX.len()];
        if basename.is_empty() {
            return Err(unsupported());
        }
        let identifier = basename.replace('+', " ");

        let path = assets_dir.join("snapshots").join(&identifier);
        Ok(Self {
            url: url.to_string(),
            downloads_dir: assets_dir.join("downloads"),
            contents_path: path.join("contents.tar.gz"),
            metadata_path: path.join("metadata.json"),
            path,
            identifier,
            file_name,
        })
    }

    /// Where `sync` expects a downloaded copy of the snapshot archive.
    pub fn download_path(&self) -> PathBuf {
        self.downloads_dir.join(&self.file_name)
    }

    pub fn metadata(&self) -> Result<SnapshotMetadata> {
        let raw = fs::read_to_string(&self.metadata_path).map_err(|_| SourceError::NotSynced {
            url: self.url.clone(),
            path: self.metadata_path.clone(),
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            SourceError::InvalidMetadata { path: self.metadata_path.clone(), message: e.to_string() }
                .into()
        })
    }
}

impl Source for SnapshotSource {
    fn url(&self) -> &str {
        &self.url
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn sync(&self) -> Result<()> {
        info!("Syncing '{}'...", self.url);
        if self.path.exists() {
            return Ok(());
        }

        let download = self.download_path();
        if !download.exists() {
            return Err(SourceError::NotSynced { url: self.url.clone(), path: download }.into());
        }

        let parent = self.path.parent().unwrap_or(&self.path);
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create snapshots directory {}", parent.display()))?;

        // Unpack next to the destination so the final move is a rename.
        let staging = tempfile::Builder::new()
            .prefix(".snapshot-")
            .tempdir_in(parent)
            .with_context(|| format!("Failed to create staging directory in {}", parent.display()))?;
        extract_tar_gz(&download, staging.path())
            .with_context(|| format!("Failed to extract snapshot {}", download.display()))?;

        let staged = staging.keep();
        fs::rename(&staged, &self.path).with_context(|| {
            format!("Failed to move snapshot into place at {}", self.path.display())
        })?;
        info!("Extracted '{}' to {}.", self.identifier, self.path.display());
        Ok(())
    }

    fn assets(&self) -> Result<Assets<'_>> {
        let metadata = self.metadata()?;
        let resolver = SnapshotResolver {
            source: ReferenceItem::with_url(metadata.title, metadata.url.clone()),
            site_url: metadata.url,
        };
        let walker = walk(&self.contents_path, &self.path);
        Ok(Box::new(walker.leaves().map(move |(path, chain)| (path, resolver.resolve(chain)))))
    }

    fn describe(&self) -> Result<SourceDescription> {
        let metadata = self.metadata()?;
        Ok(SourceDescription {
            name: metadata.title,
            description: None,
            url: None,
            html_url: metadata.url,
            path: None,
        })
    }
}
