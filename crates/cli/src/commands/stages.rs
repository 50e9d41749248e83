use anyhow::Result;
use curator_core::services::pipeline;

use crate::commands::open_library;

pub fn sync_command(library: &str) -> Result<()> {
    let (_path, ctx) = open_library(library)?;
    pipeline::sync(&ctx)?;
    println!("Synced {} source(s).", ctx.sources.len());
    Ok(())
}

pub fn index_command(library: &str) -> Result<()> {
    let (_path, ctx) = open_library(library)?;
    let decoder = ctx.decoder();
    let releases = pipeline::index(&ctx, &decoder)?;
    println!("Indexed {} release(s).", releases.len());
    println!("  Index: {}", ctx.layout.releases_path.display());
    Ok(())
}

pub fn group_command(library: &str) -> Result<()> {
    let (_path, ctx) = open_library(library)?;
    let grouped = pipeline::group(&ctx)?;
    println!("Grouped {} program(s).", grouped.programs.len());
    println!("  Index dir: {}", ctx.layout.index_dir.display());
    Ok(())
}

pub fn overlay_command(library: &str) -> Result<()> {
    let (_path, ctx) = open_library(library)?;
    pipeline::overlay(&ctx)?;
    println!("Published to {}", ctx.layout.output_dir.display());
    Ok(())
}

/// `index`, `group` and `overlay`, optionally preceded by `sync`.
pub fn build_command(library: &str, sync: bool) -> Result<()> {
    let (_path, ctx) = open_library(library)?;
    let decoder = ctx.decoder();
    let summary = pipeline::build(&ctx, &decoder, sync)?;
    println!("Built library:");
    println!("  Releases: {}", summary.installer_count);
    println!("  Programs (uids): {}", summary.uid_count);
    println!("  Versions: {}", summary.version_count);
    println!("  Unique files: {}", summary.sha_count);
    println!("  Output: {}", ctx.layout.output_dir.display());
    Ok(())
}
