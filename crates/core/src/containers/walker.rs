use std::env;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::containers::registry::{default_registry, Extractor};
use crate::containers::{ExtractError, ExtractionRegistry};
use crate::model::{ProvenanceChain, ReferenceItem};

/// Outcome of visiting one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A non-container file and the chain of containers it was found in.
    Leaf { path: PathBuf, chain: ProvenanceChain },
    /// A container (or directory) that could not be read; nothing inside it is
    /// yielded.
    Skipped { path: PathBuf, chain: ProvenanceChain, reason: String },
}

enum Frame {
    Visit { path: PathBuf, chain: ProvenanceChain, relative_to: PathBuf },
    /// Scratch directory holding an unpacked container. Popped once every
    /// frame above it has been visited, which removes it.
    Scratch(TempDir),
}

/// Lazy, depth-first walk over a location, descending into containers.
///
/// The walker keeps an explicit stack instead of recursing, so deeply nested
/// containers do not grow the call stack. Scratch directories live on that
/// stack and are removed as soon as the walk moves past them, or when the
/// walker is dropped. A yielded leaf path stays valid until the walker
/// advances past the container holding it.
pub struct Walker {
    registry: ExtractionRegistry,
    scratch_root: Option<PathBuf>,
    stack: Vec<Frame>,
}

/// Walk `location` with the default extraction registry. Reference names are
/// relative to `relative_to`.
pub fn walk(location: impl AsRef<Path>, relative_to: impl AsRef<Path>) -> Walker {
    Walker::new(location).relative_to(relative_to)
}

impl Walker {
    /// Walk `location`. Names are relative to `location` itself when it is a
    /// directory and to its parent when it is a file.
    pub fn new(location: impl AsRef<Path>) -> Self {
        let path = absolute(location.as_ref());
        let relative_to = if path.is_dir() {
            path.clone()
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone())
        };
        Self {
            registry: default_registry(),
            scratch_root: None,
            stack: vec![Frame::Visit { path, chain: Vec::new(), relative_to }],
        }
    }

    /// Resolve reference names against `root` instead of the default.
    pub fn relative_to(mut self, root: impl AsRef<Path>) -> Self {
        let root = absolute(root.as_ref());
        for frame in &mut self.stack {
            if let Frame::Visit { relative_to, .. } = frame {
                *relative_to = root.clone();
            }
        }
        self
    }

    pub fn with_registry(mut self, registry: ExtractionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl AsRef<Path>) -> Self {
        self.scratch_root = Some(absolute(root.as_ref()));
        self
    }

    /// Only the leaves, dropping skip events (which are already logged).
    pub fn leaves(self) -> impl Iterator<Item = (PathBuf, ProvenanceChain)> {
        self.filter_map(|event| match event {
            WalkEvent::Leaf { path, chain } => Some((path, chain)),
            WalkEvent::Skipped { .. } => None,
        })
    }

    fn visit_directory(&mut self, directory: &Path, chain: &ProvenanceChain, relative_to: &Path) {
        let mut files = Vec::new();
        for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Failed to read '{}' with error '{}'.", directory.display(), err);
                    continue;
                }
            };
            // Linked directories are listed but never entered.
            if entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir()) {
                continue;
            }
            // Resource forks left behind by macOS.
            if entry.file_name().to_string_lossy().starts_with("._") {
                continue;
            }
            files.push(entry.into_path());
        }

        for path in files.into_iter().rev() {
            self.stack.push(Frame::Visit {
                path,
                chain: chain.clone(),
                relative_to: relative_to.to_path_buf(),
            });
        }
    }

    fn unpack(&self, path: &Path, extractor: &Extractor) -> Result<TempDir, ExtractError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("curator-");
        let scratch = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        (extractor.extract)(path, scratch.path())?;
        Ok(scratch)
    }
}

impl Iterator for Walker {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        loop {
            let (path, chain, relative_to) = match self.stack.pop()? {
                Frame::Scratch(scratch) => {
                    let location = scratch.path().to_path_buf();
                    if let Err(err) = scratch.close() {
                        warn!("Failed to remove '{}' with error '{}'.", location.display(), err);
                    }
                    continue;
                }
                Frame::Visit { path, chain, relative_to } => (path, chain, relative_to),
            };

            if path.is_dir() {
                self.visit_directory(&path, &chain, &relative_to);
                continue;
            }

            let mut chain = chain;
            chain.push(ReferenceItem::new(relative_name(&path, &relative_to)));

            let extractor = match self.registry.lookup(&path) {
                Some(extractor) => extractor.clone(),
                None => return Some(WalkEvent::Leaf { path, chain }),
            };

            debug!("Extracting '{}' ({})...", path.display(), extractor.name);
            match self.unpack(&path, &extractor) {
                Ok(scratch) => {
                    let contents = scratch.path().to_path_buf();
                    self.stack.push(Frame::Scratch(scratch));
                    self.stack.push(Frame::Visit {
                        path: contents.clone(),
                        chain,
                        relative_to: contents,
                    });
                }
                Err(err) => {
                    warn!("Failed to extract file '{}' with error '{}'.", path.display(), err);
                    return Some(WalkEvent::Skipped { path, chain, reason: err.to_string() });
                }
            }
        }
    }
}

fn relative_name(path: &Path, relative_to: &Path) -> String {
    path.strip_prefix(relative_to).unwrap_or(path).to_string_lossy().to_string()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
