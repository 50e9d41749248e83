//! Format decoder capability.
//!
//! Installer and resource parsing lives outside this crate. The release
//! builder only sees the [`FormatDecoder`] trait, so traversal and grouping can
//! be exercised with stub decoders; [`ToolDecoder`] is the production
//! implementation that shells out to an external decoder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::IconBitmap;

mod tool;

pub use tool::{ToolDecoder, DECODER_ENV};

/// Localized strings keyed by locale (e.g. `en_GB`); the empty key is the
/// locale-neutral entry.
pub type LocalizedNames = BTreeMap<String, String>;

/// Metadata decoded from an installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerInfo {
    pub uid: u32,
    pub names: LocalizedNames,
    pub version: String,
}

/// Metadata decoded from an icon resource (application information file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub uid3: u32,
    pub captions: LocalizedNames,
}

/// Era/type classification of an arbitrary file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recognition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file is not in the format the decoder was asked to read.
    #[error("Not a recognized {expected}: {path}")]
    Unrecognized { path: PathBuf, expected: &'static str },
    #[error("Malformed {what} at {path}: {message}")]
    Malformed { path: PathBuf, what: &'static str, message: String },
    #[error("Decoder error: {0}")]
    Tool(String),
}

/// Reads installers and icon resources.
pub trait FormatDecoder {
    fn decode_installer(&self, path: &Path) -> Result<InstallerInfo, DecodeError>;

    /// Unpack the payload of an installer into `destination` (an existing,
    /// empty directory).
    fn extract_installer(&self, path: &Path, destination: &Path) -> Result<(), DecodeError>;

    fn decode_resource(&self, path: &Path) -> Result<ResourceInfo, DecodeError>;

    /// Icon bitmaps embedded in a resource, PNG encoded.
    fn icons(&self, path: &Path) -> Result<Vec<IconBitmap>, DecodeError>;

    fn recognize(&self, path: &Path) -> Result<Recognition, DecodeError>;

    fn name(&self) -> &'static str;
}
