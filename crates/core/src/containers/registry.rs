use std::fmt;
use std::path::Path;

use crate::containers::extract;
use crate::containers::ExtractError;

/// Extraction procedure: unpack `source` into the existing directory
/// `destination`. Both paths are absolute.
pub type ExtractFn = fn(source: &Path, destination: &Path) -> Result<(), ExtractError>;

/// A registered container type.
#[derive(Clone)]
pub struct Extractor {
    /// Lower-case suffix including the leading dot (e.g. `.tar.gz`).
    pub suffix: String,
    /// Short name used in log messages.
    pub name: &'static str,
    pub extract: ExtractFn,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor").field("suffix", &self.suffix).field("name", &self.name).finish()
    }
}

/// Maps container suffixes to extraction procedures.
///
/// Lookup is case-insensitive and the longest matching suffix wins, so
/// `.tar.gz` is preferred over `.gz` regardless of registration order.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRegistry {
    extractors: Vec<Extractor>,
}

impl ExtractionRegistry {
    /// An empty registry: every file is a leaf.
    pub fn new() -> Self {
        Self { extractors: Vec::new() }
    }

    /// Register (or replace) the procedure for `suffix`.
    pub fn register(&mut self, suffix: &str, name: &'static str, extract: ExtractFn) -> &mut Self {
        let suffix = suffix.to_lowercase();
        self.extractors.retain(|e| e.suffix != suffix);
        self.extractors.push(Extractor { suffix, name, extract });
        self
    }

    pub fn lookup(&self, path: &Path) -> Option<&Extractor> {
        let file_name = path.file_name()?.to_string_lossy().to_lowercase();
        self.extractors
            .iter()
            .filter(|e| file_name.ends_with(&e.suffix))
            .max_by_key(|e| e.suffix.len())
    }

    /// Return the sorted list of registered suffixes.
    pub fn suffixes(&self) -> Vec<String> {
        let mut suffixes: Vec<String> = self.extractors.iter().map(|e| e.suffix.clone()).collect();
        suffixes.sort();
        suffixes
    }
}

/// Registry covering the container formats found in the archive: disk images
/// and cabinets go through `7z`, tarballs and zips are unpacked natively.
pub fn default_registry() -> ExtractionRegistry {
    let mut registry = ExtractionRegistry::new();
    registry
        .register(".7z", "7z", extract::extract_7z)
        .register(".cab", "7z", extract::extract_7z)
        .register(".ima", "7z", extract::extract_7z)
        .register(".iso", "7z", extract::extract_7z)
        .register(".vhd", "7z", extract::extract_7z)
        .register(".tar", "tar", extract::extract_tar)
        .register(".tar.gz", "tar.gz", extract::extract_tar_gz)
        .register(".tgz", "tar.gz", extract::extract_tar_gz)
        .register(".zip", "zip", extract::extract_zip);
    registry
}
