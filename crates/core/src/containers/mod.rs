//! Nested container traversal.
//!
//! - `registry`: maps file suffixes to extraction procedures.
//! - `extract`: the extraction procedures themselves (zip, tar, tar.gz, 7z).
//! - `walker`: walks a location, unpacking containers into scratch
//!   directories, and yields every non-container file with its provenance.

use std::io;

use thiserror::Error;

pub mod extract;
pub mod registry;
pub mod walker;

pub use registry::{default_registry, ExtractFn, ExtractionRegistry, Extractor};
pub use walker::{walk, WalkEvent, Walker};

/// Failure to unpack a container. Always recoverable: the walker logs it and
/// skips the container.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid or corrupt ZIP: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },
}
