use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::library::{LibraryConfig, LibraryLayout};

/// Environment variable overriding `assets_directory`.
pub const ASSETS_DIRECTORY_ENV: &str = "CURATOR_ASSETS_DIRECTORY";

/// Load the library definition YAML from disk.
pub fn load_library_config(path: &Path) -> Result<LibraryConfig> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read library config at {}", path.display()))?;
    let config: LibraryConfig =
        serde_yaml::from_str(&body).context("Failed to parse library config YAML")?;
    Ok(config)
}

/// Write the library definition back to disk.
pub fn save_library_config(path: &Path, config: &LibraryConfig) -> Result<()> {
    let body = serde_yaml::to_string(config).context("Failed to serialize library config")?;
    fs::write(path, body)
        .with_context(|| format!("Failed to write library config at {}", path.display()))?;
    Ok(())
}

/// Compute the layout for a loaded definition, honouring
/// `CURATOR_ASSETS_DIRECTORY`.
pub fn resolve_layout(path: &Path, config: &LibraryConfig) -> LibraryLayout {
    let layout = LibraryLayout::new(path, config);
    match std::env::var_os(ASSETS_DIRECTORY_ENV) {
        Some(assets) if !assets.is_empty() => {
            let assets = PathBuf::from(assets);
            warn!("Using ${} environment variable ({})", ASSETS_DIRECTORY_ENV, assets.display());
            layout.with_assets_dir(assets)
        }
        _ => layout,
    }
}
