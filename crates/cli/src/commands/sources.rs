use std::path::Path;

use anyhow::{Context, Result};
use curator_core::library::{
    load_library_config, resolve_layout, save_library_config, LibraryConfig,
};
use curator_core::sources::create_source;

use crate::canonicalize_or_current;

/// Add a source URL to the definition, creating the definition if needed.
pub fn add_source_command(library: &str, url: &str) -> Result<()> {
    let path = canonicalize_or_current(library)?;
    let mut config = if path.exists() { load_library_config(&path)? } else { LibraryConfig::new() };

    // Reject anything no source kind understands before touching the file.
    let layout = resolve_layout(&path, &config);
    create_source(&layout.assets_dir, url)
        .with_context(|| format!("Failed to add source '{url}'"))?;

    let added = config.add_source(url);
    write_definition(&path, &config)?;

    if added {
        println!("Added source: {url}");
    } else {
        println!("Source already present: {url}");
    }
    println!("Sources ({}):", config.sources.len());
    for source in &config.sources {
        println!("  - {source}");
    }
    Ok(())
}

fn write_definition(path: &Path, config: &LibraryConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    save_library_config(path, config)
}
