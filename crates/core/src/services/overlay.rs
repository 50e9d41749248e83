use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// File holding an overlay's front matter and description.
pub const OVERLAY_DOCUMENT: &str = "index.md";

const FRONT_MATTER_FENCE: &str = "---";

/// Curated material for one program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayEntry {
    /// Screenshot files, sorted by file name.
    pub screenshots: Vec<PathBuf>,
    pub document: Option<OverlayDocument>,
}

/// Parsed `index.md`: YAML front matter plus a Markdown body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayDocument {
    pub metadata: Map<String, Value>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    /// Relative to the output root: `screenshots/<uid>/<file name>`.
    pub path: String,
}

/// A screenshot the publication step has to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotCopy {
    pub source: PathBuf,
    pub relative_path: String,
}

impl OverlayDocument {
    /// Split `---` fenced YAML front matter from the body. Text without front
    /// matter is all body.
    pub fn parse(text: &str) -> Result<Self> {
        let Some((front, body)) = split_front_matter(text) else {
            return Ok(Self { metadata: Map::new(), content: text.trim().to_string() });
        };
        let metadata = if front.trim().is_empty() {
            Map::new()
        } else {
            match serde_yaml::from_str::<Value>(front).context("Failed to parse front matter YAML")? {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => return Err(anyhow!("Front matter must be a mapping, found {other}")),
            }
        };
        Ok(Self { metadata, content: body.trim().to_string() })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read overlay document at {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid overlay document at {}", path.display()))
    }
}

fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != FRONT_MATTER_FENCE {
        return None;
    }
    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == FRONT_MATTER_FENCE {
            return Some((&text[start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Read every overlay directory. Later directories replace the entries of
/// earlier ones for the same uid.
pub fn load_overlays(directories: &[PathBuf]) -> Result<BTreeMap<String, OverlayEntry>> {
    let mut overlays = BTreeMap::new();
    for directory in directories {
        info!("Loading overlay '{}'...", directory.display());
        let entries = fs::read_dir(directory)
            .with_context(|| format!("Failed to read overlay directory {}", directory.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to list {}", directory.display()))?;
            let uid = entry.file_name().to_string_lossy().to_string();
            if uid.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            overlays.insert(uid, load_entry(&entry.path())?);
        }
    }
    Ok(overlays)
}

fn load_entry(directory: &Path) -> Result<OverlayEntry> {
    let mut screenshots = Vec::new();
    for entry in fs::read_dir(directory)
        .with_context(|| format!("Failed to read overlay directory {}", directory.display()))?
    {
        let path = entry.with_context(|| format!("Failed to list {}", directory.display()))?.path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            screenshots.push(path);
        }
    }
    screenshots.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let document_path = directory.join(OVERLAY_DOCUMENT);
    let document =
        if document_path.is_file() { Some(OverlayDocument::load(&document_path)?) } else { None };
    Ok(OverlayEntry { screenshots, document })
}

/// Merge curated material into serialized programs.
///
/// Returns the screenshots that must be copied into the published tree.
/// Merging the same overlays twice yields the same programs.
pub fn merge(
    programs: &mut [Value],
    overlays: &BTreeMap<String, OverlayEntry>,
) -> Result<Vec<ScreenshotCopy>> {
    let mut copies = Vec::new();
    for program in programs.iter_mut() {
        let Value::Object(fields) = program else {
            continue;
        };
        let Some(uid) = fields.get("uid").and_then(Value::as_str).map(str::to_string) else {
            continue;
        };

        let Some(overlay) = overlays.get(&uid) else {
            fields.insert("screenshots".to_string(), Value::Array(Vec::new()));
            continue;
        };

        if let Some(document) = &overlay.document {
            fields.insert("description".to_string(), Value::String(document.content.clone()));
            for (key, value) in &document.metadata {
                fields.insert(key.clone(), value.clone());
            }
        }

        let mut screenshots = Vec::new();
        for source in &overlay.screenshots {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let relative_path = format!("screenshots/{uid}/{file_name}");
            let (width, height) = image::image_dimensions(source)
                .with_context(|| format!("Failed to read screenshot {}", source.display()))?;
            debug!("Screenshot '{}' is {}x{}.", relative_path, width, height);
            screenshots.push(Screenshot { width, height, path: relative_path.clone() });
            copies.push(ScreenshotCopy { source: source.clone(), relative_path });
        }
        fields.insert("screenshots".to_string(), serde_json::to_value(screenshots)?);
    }
    Ok(copies)
}
