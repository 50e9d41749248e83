use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::decoder::{DecodeError, FormatDecoder, LocalizedNames};
use crate::model::{Icon, ProvenanceChain, Release, ReleaseKind};
use crate::sources::Source;
use crate::store::{ContentStore, ErrorChannel};

/// Locales tried, in order, when picking a display name.
pub const LANGUAGE_ORDER: &[&str] =
    &["en_GB", "en_US", "en_AU", "fr_FR", "de_DE", "it_IT", "nl_NL", "bg_BG", ""];

/// Version recorded for standalone programs, which carry none.
pub const UNKNOWN_VERSION: &str = "Unknown";

const RESOURCE_EXTENSION: &str = "aif";

#[derive(Debug, Error)]
#[error("No supported localizations found in {candidates:?}")]
pub struct MissingName {
    pub candidates: Vec<String>,
}

/// Why a file was rejected.
#[derive(Debug, Error)]
pub enum RejectReason {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    MissingName(#[from] MissingName),
}

#[derive(Debug, Error)]
pub enum ImportError {
    /// The file at `path` could not be decoded; it is reported and skipped.
    #[error("{reason}")]
    Rejected { path: PathBuf, reason: RejectReason },
    /// Store or filesystem failure; aborts the run.
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

fn rejected<E: Into<RejectReason>>(path: &Path) -> impl FnOnce(E) -> ImportError + '_ {
    move |err| ImportError::Rejected { path: path.to_path_buf(), reason: err.into() }
}

/// Pick a display name following [`LANGUAGE_ORDER`].
pub fn select_name(names: &LocalizedNames) -> Result<String, MissingName> {
    for language in LANGUAGE_ORDER {
        if let Some(name) = names.get(*language) {
            return Ok(name.clone());
        }
    }
    error!("Failed to select a name from candidates '{:?}'.", names);
    Err(MissingName { candidates: names.keys().cloned().collect() })
}

/// Normalize a recognized era or type.
pub fn remap_tag(tag: &str) -> String {
    match tag {
        "opl" | "opo" | "opa" => "opl".to_string(),
        "er5" => "epoc32".to_string(),
        other => other.to_string(),
    }
}

/// Classification by extension.
pub fn classify(path: &Path) -> Option<ReleaseKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "sis" => Some(ReleaseKind::Installer),
        "app" | "opa" => Some(ReleaseKind::Standalone),
        _ => None,
    }
}

/// Turns walked files into releases.
///
/// Decode failures go to the error channel and the file is left out; store
/// failures are returned.
pub struct ReleaseBuilder<'a> {
    pub decoder: &'a dyn FormatDecoder,
    pub files: &'a ContentStore,
    pub errors: &'a ErrorChannel,
}

impl<'a> ReleaseBuilder<'a> {
    pub fn import_source(&self, source: &dyn Source) -> anyhow::Result<Vec<Release>> {
        info!("Importing source '{}'...", source.path().display());
        let assets = source
            .assets()
            .with_context(|| format!("Failed to read source '{}'", source.url()))?;
        self.import_assets(assets)
    }

    pub fn import_assets(
        &self,
        assets: impl IntoIterator<Item = (PathBuf, ProvenanceChain)>,
    ) -> anyhow::Result<Vec<Release>> {
        let mut releases = Vec::new();
        for (path, reference) in assets {
            if let Some(release) = self.import_file(&path, reference)? {
                releases.push(release);
            }
        }
        Ok(releases)
    }

    /// Import one file. `Ok(None)` covers both "not a release" and "reported
    /// to the error channel".
    pub fn import_file(
        &self,
        path: &Path,
        reference: ProvenanceChain,
    ) -> anyhow::Result<Option<Release>> {
        let result = match classify(path) {
            None => return Ok(None),
            Some(ReleaseKind::Installer) => {
                info!("Importing installer '{}'...", path.display());
                self.import_installer(path, reference)
            }
            Some(ReleaseKind::Standalone) => {
                info!("Importing app '{}'...", path.display());
                self.import_standalone(path, reference)
            }
        };
        match result {
            Ok(release) => Ok(Some(release)),
            Err(ImportError::Rejected { path: failing, reason }) => {
                error!("Failed to import '{}' with message '{}'.", path.display(), reason);
                if let Err(err) = self.errors.report(&failing, &reason) {
                    error!("Failed to report '{}' with error '{:#}'.", failing.display(), err);
                }
                Ok(None)
            }
            Err(ImportError::Io(err)) => Err(err),
        }
    }

    /// Every failure is reported against the installer itself; its scratch
    /// contents are gone once this returns.
    pub fn import_installer(
        &self,
        path: &Path,
        reference: ProvenanceChain,
    ) -> Result<Release, ImportError> {
        let info = self.decoder.decode_installer(path).map_err(rejected(path))?;
        let name = select_name(&info.names).map_err(rejected(path))?;

        let scratch = tempfile::Builder::new()
            .prefix("curator-sis-")
            .tempdir()
            .context("Failed to create installer scratch directory")?;
        self.decoder.extract_installer(path, scratch.path()).map_err(rejected(path))?;

        let tags = self.discover_tags(scratch.path());
        let icons = match first_resource(scratch.path()) {
            Some(resource) => self.icons(&resource).map_err(rejected(path))?,
            None => Vec::new(),
        };

        let sha256 = self.files.stage_file(path)?;
        Ok(Release {
            filename: file_name(path),
            size: file_size(path)?,
            reference,
            kind: ReleaseKind::Installer,
            uid: format!("0x{:08x}", info.uid),
            sha256,
            name,
            version: info.version,
            icons,
            tags,
        })
    }

    pub fn import_standalone(
        &self,
        path: &Path,
        reference: ProvenanceChain,
    ) -> Result<Release, ImportError> {
        let directory = path.parent().unwrap_or(path);
        let tags = self.discover_tags(directory);
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

        let (uid3, name, icons) = match find_sibling(path, &format!("{stem}.{RESOURCE_EXTENSION}")) {
            Some(resource) => {
                let info = self.decoder.decode_resource(&resource).map_err(rejected(&resource))?;
                let name = select_name(&info.captions).map_err(rejected(&resource))?;
                (Some(info.uid3), name, self.icons(&resource).map_err(rejected(&resource))?)
            }
            // Some apps embed their own resource; most don't.
            None => match self.decoder.decode_resource(path) {
                Ok(info) => {
                    let name = select_name(&info.captions).map_err(rejected(path))?;
                    (None, name, self.icons(path).map_err(rejected(path))?)
                }
                Err(DecodeError::Unrecognized { .. }) => (None, stem, Vec::new()),
                Err(err) => return Err(rejected(path)(err)),
            },
        };

        let sha256 = self.files.stage_file(path)?;
        let uid = match uid3 {
            Some(uid3) => format!("0x{uid3:08x}"),
            None => sha256.clone(),
        };
        Ok(Release {
            filename: file_name(path),
            size: file_size(path)?,
            reference,
            kind: ReleaseKind::Standalone,
            uid,
            sha256,
            name,
            version: UNKNOWN_VERSION.to_string(),
            icons,
            tags,
        })
    }

    fn icons(&self, resource: &Path) -> Result<Vec<Icon>, DecodeError> {
        let bitmaps = self.decoder.icons(resource)?;
        Ok(bitmaps.into_iter().map(Icon::from_bitmap).collect())
    }

    /// Recognize every file under `directory` and collect eras and types.
    pub fn discover_tags(&self, directory: &Path) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        for entry in WalkDir::new(directory).sort_by_file_name().into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            match self.decoder.recognize(entry.path()) {
                Ok(recognition) => {
                    tags.extend(recognition.era.as_deref().map(remap_tag));
                    tags.extend(recognition.kind.as_deref().map(remap_tag));
                }
                Err(err) => debug!("Failed to recognize '{}': {}", entry.path().display(), err),
            }
        }
        tags.remove("unknown");
        tags
    }
}

/// First icon resource under `directory`, in sorted order.
fn first_resource(directory: &Path) -> Option<PathBuf> {
    WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(RESOURCE_EXTENSION))
        })
}

/// Case-insensitive lookup of `name` next to `path`.
fn find_sibling(path: &Path, name: &str) -> Option<PathBuf> {
    let directory = path.parent()?;
    let wanted = name.to_lowercase();
    let mut matches: Vec<PathBuf> = fs::read_dir(directory)
        .ok()?
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().to_lowercase() == wanted)
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    matches.into_iter().next()
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

fn file_size(path: &Path) -> anyhow::Result<u64> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    Ok(metadata.len())
}
