use serde::{Deserialize, Serialize};

/// Serializable library definition.
///
/// Directory entries are relative to the definition file unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Source URLs (archive items or website snapshots).
    #[serde(default)]
    pub sources: Vec<String>,
    /// Directories holding per-uid overlay metadata and screenshots.
    #[serde(default)]
    pub overlays: Vec<String>,
    /// Where synced source material lives.
    pub assets_directory: String,
    /// Scratch output of the `index` stage.
    pub intermediates_directory: String,
    /// Output of the `group` stage.
    pub index_directory: String,
    /// Final published tree written by the `overlay` stage.
    pub output_directory: String,
    /// Optional explicit path to the format decoder tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoder_command: Option<String>,
}

impl LibraryConfig {
    /// A definition with the conventional directory names and no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            overlays: Vec::new(),
            assets_directory: "assets".to_string(),
            intermediates_directory: "intermediates".to_string(),
            index_directory: "index".to_string(),
            output_directory: "site".to_string(),
            decoder_command: None,
        }
    }

    /// Add `url` to the sources, keeping them unique and sorted
    /// case-insensitively. Returns `false` if it was already present.
    pub fn add_source(&mut self, url: &str) -> bool {
        let added = !self.sources.iter().any(|s| s == url);
        if added {
            self.sources.push(url.to_string());
        }
        self.sources.sort_by_key(|s| s.to_lowercase());
        self.sources.dedup();
        added
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self::new()
    }
}
