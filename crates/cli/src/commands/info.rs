use anyhow::Result;
use curator_core::model::Summary;
use curator_core::services::pipeline::read_summary;
use serde::Serialize;

use crate::commands::{open_library, print_dir_status};

#[derive(Serialize)]
pub struct LibraryInfoSnapshot {
    pub definition: String,
    pub root: String,
    pub decoder: String,
    pub layout: LibraryInfoLayout,
    pub sources: Vec<String>,
    pub overlays: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

#[derive(Serialize)]
pub struct LibraryInfoLayout {
    pub assets_dir: String,
    pub intermediates_dir: String,
    pub index_dir: String,
    pub output_dir: String,
}

/// Show basic information about a library.
pub fn library_info_command(library: &str, json: bool) -> Result<()> {
    let (path, ctx) = open_library(library)?;
    let layout = &ctx.layout;
    let summary = read_summary(&ctx)?;
    let decoder = ctx.decoder();

    if json {
        let snapshot = LibraryInfoSnapshot {
            definition: path.display().to_string(),
            root: layout.root.display().to_string(),
            decoder: decoder.program().display().to_string(),
            layout: LibraryInfoLayout {
                assets_dir: layout.assets_dir.display().to_string(),
                intermediates_dir: layout.intermediates_dir.display().to_string(),
                index_dir: layout.index_dir.display().to_string(),
                output_dir: layout.output_dir.display().to_string(),
            },
            sources: ctx.config.sources.clone(),
            overlays: layout.overlay_dirs.iter().map(|d| d.display().to_string()).collect(),
            summary,
        };
        let serialized = serde_json::to_string_pretty(&snapshot)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Archive Curator Library Info");
    println!("============================");
    println!("Definition: {}", path.display());
    println!("Root: {}", layout.root.display());
    println!("Decoder: {}", decoder.program().display());
    println!();

    println!("Directories:");
    print_dir_status("Assets dir", &layout.assets_dir);
    print_dir_status("Intermediates dir", &layout.intermediates_dir);
    print_dir_status("Index dir", &layout.index_dir);
    print_dir_status("Output dir", &layout.output_dir);
    for overlay in &layout.overlay_dirs {
        print_dir_status("Overlay dir", overlay);
    }
    println!();

    println!("Sources ({}):", ctx.config.sources.len());
    for source in &ctx.config.sources {
        println!("- {source}");
    }

    if let Some(summary) = summary {
        println!();
        println!("Summary:");
        println!("  Releases: {}", summary.installer_count);
        println!("  Programs (uids): {}", summary.uid_count);
        println!("  Versions: {}", summary.version_count);
        println!("  Unique files: {}", summary.sha_count);
    }
    Ok(())
}
