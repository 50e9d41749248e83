//! Core data model: provenance chains, releases and icons.
//!
//! A `Release` is built once by the release builder and never mutated. Every
//! other JSON shape written by the pipeline (published releases, variant
//! items, program entries) is a projection of it; see `services::grouping`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::store::ContentStore;

/// One hop in a provenance chain.
///
/// `url` is only ever filled in by a reference resolver; the container walker
/// leaves it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub name: String,
    pub url: Option<String>,
}

impl ReferenceItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), url: None }
    }

    pub fn with_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: Some(url.into()) }
    }
}

/// Ordered root-to-leaf list of the containers a file was found in.
pub type ProvenanceChain = Vec<ReferenceItem>;

/// How a release is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    Installer,
    Standalone,
}

impl ReleaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseKind::Installer => "installer",
            ReleaseKind::Standalone => "standalone",
        }
    }
}

/// Raw bitmap handed back by a format decoder, already encoded as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBitmap {
    pub width: u32,
    pub height: u32,
    pub bpp: u32,
    pub png: Vec<u8>,
}

/// Content-addressed icon.
///
/// The PNG bytes are kept in memory until [`Icon::write`] stores them in the
/// icon store; they are never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub bpp: u32,
    pub sha256: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Icon {
    pub fn from_bitmap(bitmap: IconBitmap) -> Self {
        let sha256 = crate::store::sha256_bytes(&bitmap.png);
        Self {
            filename: format!("{sha256}.png"),
            width: bitmap.width,
            height: bitmap.height,
            bpp: bitmap.bpp,
            sha256,
            data: bitmap.png,
        }
    }

    /// Store the icon under its content-addressed file name.
    pub fn write(&self, icons: &ContentStore) -> Result<PathBuf> {
        icons.put(&self.filename, &self.data)
    }
}

/// A single discovered, decoded and hashed release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub filename: String,
    pub size: u64,
    pub reference: ProvenanceChain,
    pub kind: ReleaseKind,
    pub uid: String,
    pub sha256: String,
    pub name: String,
    pub version: String,
    pub icons: Vec<Icon>,
    pub tags: BTreeSet<String>,
}

/// Aggregate counts over the release collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub installer_count: usize,
    pub uid_count: usize,
    pub version_count: usize,
    pub sha_count: usize,
}
