//! Content-addressed file stores and the error channel.
//!
//! Stores are write-once per name: content is staged in a temporary file next
//! to its destination and persisted without clobbering. Finding the
//! destination already present counts as success since a name is a hash.

use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

mod errors;

pub use errors::ErrorChannel;

/// Chunk size used when streaming files through the hasher.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    let mut reader = BufReader::with_capacity(HASH_CHUNK_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute the SHA-256 hash of an in-memory buffer as a hex string.
pub fn sha256_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// A flat directory of immutable files named by their content hash.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store directory: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Hash `path` and copy it into the store under that hash.
    ///
    /// Returns the hash. An existing copy is left untouched.
    pub fn stage_file(&self, path: &Path) -> Result<String> {
        let sha256 = sha256_file(path)?;
        let destination = self.path_for(&sha256);
        if destination.exists() {
            return Ok(sha256);
        }

        let mut staged = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("Failed to stage file in {}", self.root.display()))?;
        let mut source = fs::File::open(path)
            .with_context(|| format!("Failed to open {} for staging", path.display()))?;
        io::copy(&mut source, staged.as_file_mut())
            .with_context(|| format!("Failed to copy {} into the store", path.display()))?;
        persist_once(staged, &destination)?;
        Ok(sha256)
    }

    /// Store `data` under `name` unless that name is already present.
    pub fn put(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let destination = self.path_for(name);
        if destination.exists() {
            return Ok(destination);
        }

        let mut staged = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("Failed to stage file in {}", self.root.display()))?;
        staged
            .write_all(data)
            .with_context(|| format!("Failed to write staged copy of {name}"))?;
        persist_once(staged, &destination)?;
        Ok(destination)
    }
}

fn persist_once(staged: NamedTempFile, destination: &Path) -> Result<()> {
    match staged.persist_noclobber(destination) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err::<(), _>(err.error)
            .with_context(|| format!("Failed to persist {}", destination.display())),
    }
}
