use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::decoder::FormatDecoder;
use crate::library::LibraryContext;
use crate::model::{Release, Summary};
use crate::services::grouping::{group as group_releases, GroupedIndex};
use crate::services::overlay::{load_overlays, merge};
use crate::services::releases::ReleaseBuilder;
use crate::sources::SourceDescription;
use crate::store::{ContentStore, ErrorChannel};

/// API collections mirrored under `api/v1/<name>/index.json`.
const API_COLLECTIONS: &[&str] = &["programs", "sources", "summary", "groups"];

/// Materialize local copies of every source.
pub fn sync(ctx: &LibraryContext) -> Result<()> {
    info!("Syncing library...");
    for source in &ctx.sources {
        source.sync().with_context(|| format!("Failed to sync source '{}'", source.url()))?;
    }
    Ok(())
}

/// Walk every source, build releases and write the intermediate index.
pub fn index(ctx: &LibraryContext, decoder: &dyn FormatDecoder) -> Result<Vec<Release>> {
    let layout = &ctx.layout;
    reset_dir(&layout.intermediates_dir)?;
    let files = ContentStore::open(&layout.files_dir)?;
    let icons = ContentStore::open(&layout.icons_dir)?;
    let errors = ErrorChannel::open(&layout.errors_dir)?;

    info!("Indexing...");
    let builder = ReleaseBuilder { decoder, files: &files, errors: &errors };
    let mut releases = Vec::new();
    for source in &ctx.sources {
        releases.extend(builder.import_source(source.as_ref())?);
    }

    info!("Writing icons to '{}'...", layout.icons_dir.display());
    for release in &releases {
        for icon in &release.icons {
            icon.write(&icons)?;
        }
    }

    info!("Writing intermediate index to '{}'...", layout.releases_path.display());
    write_json(&layout.releases_path, &releases)?;
    info!("Indexing complete.");
    Ok(releases)
}

/// Group the intermediate index into programs and write the index directory.
pub fn group(ctx: &LibraryContext) -> Result<GroupedIndex> {
    let layout = &ctx.layout;
    let releases: Vec<Release> = read_json(&layout.releases_path)?;
    let grouped = group_releases(&releases);

    let sources = ctx
        .sources
        .iter()
        .map(|source| {
            source
                .describe()
                .with_context(|| format!("Failed to describe source '{}'", source.url()))
        })
        .collect::<Result<Vec<SourceDescription>>>()?;

    fs::create_dir_all(&layout.index_dir)
        .with_context(|| format!("Failed to create {}", layout.index_dir.display()))?;

    info!("Writing summary to '{}'...", layout.summary_path.display());
    write_json(&layout.summary_path, &grouped.summary)?;
    info!("Writing sources to '{}'...", layout.sources_path.display());
    write_json(&layout.sources_path, &sources)?;
    info!("Writing library to '{}'...", layout.programs_path.display());
    write_json(&layout.programs_path, &grouped.programs)?;
    info!("Writing group index to '{}'...", layout.groups_path.display());
    write_json(&layout.groups_path, &grouped.groups)?;

    info!("Copying files to '{}'...", layout.index_files_dir.display());
    replace_dir(&layout.files_dir, &layout.index_files_dir)?;
    info!("Copying icons to '{}'...", layout.index_icons_dir.display());
    replace_dir(&layout.icons_dir, &layout.index_icons_dir)?;

    Ok(grouped)
}

/// Merge overlays into the grouped index and write the published tree.
pub fn overlay(ctx: &LibraryContext) -> Result<()> {
    info!("Applying overlay...");
    let layout = &ctx.layout;
    let overlays = load_overlays(&layout.overlay_dirs)?;
    let mut programs: Vec<Value> = read_json(&layout.programs_path)?;
    let copies = merge(&mut programs, &overlays)?;

    for dir in [
        &layout.screenshots_dir,
        &layout.data_dir,
        &layout.output_files_dir,
        &layout.output_icons_dir,
        &layout.api_dir,
    ] {
        remove_dir(dir)?;
    }
    create_dir(&layout.data_dir)?;
    create_dir(&layout.screenshots_dir)?;

    for copy in &copies {
        let destination = layout.output_dir.join(&copy.relative_path);
        if let Some(parent) = destination.parent() {
            create_dir(parent)?;
        }
        info!("Copying '{}' to '{}'...", copy.source.display(), destination.display());
        fs::copy(&copy.source, &destination).with_context(|| {
            format!("Failed to copy screenshot {}", copy.source.display())
        })?;
    }

    let data_path = |name: &str| layout.data_dir.join(format!("{name}.json"));
    copy_file(&layout.sources_path, &data_path("sources"))?;
    copy_file(&layout.summary_path, &data_path("summary"))?;
    copy_file(&layout.groups_path, &data_path("groups"))?;
    write_json(&data_path("programs"), &programs)?;

    replace_dir(&layout.index_files_dir, &layout.output_files_dir)?;
    replace_dir(&layout.index_icons_dir, &layout.output_icons_dir)?;

    replace_dir(&layout.output_icons_dir, &layout.api_dir.join("icons"))?;
    replace_dir(&layout.screenshots_dir, &layout.api_dir.join("screenshots"))?;
    for collection in API_COLLECTIONS {
        let destination = layout.api_index_path(collection);
        if let Some(parent) = destination.parent() {
            create_dir(parent)?;
        }
        copy_file(&data_path(collection), &destination)?;
    }
    info!("Published to '{}'.", layout.output_dir.display());
    Ok(())
}

/// `index`, `group` and `overlay` in order, optionally preceded by `sync`.
pub fn build(ctx: &LibraryContext, decoder: &dyn FormatDecoder, with_sync: bool) -> Result<Summary> {
    if with_sync {
        sync(ctx)?;
    }
    index(ctx, decoder)?;
    let grouped = group(ctx)?;
    overlay(ctx)?;
    Ok(grouped.summary)
}

/// Summary written by the last `group`, if any.
pub fn read_summary(ctx: &LibraryContext) -> Result<Option<Summary>> {
    if !ctx.layout.summary_path.exists() {
        return Ok(None);
    }
    read_json(&ctx.layout.summary_path).map(Some)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse JSON at {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))
}

fn remove_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

fn reset_dir(path: &Path) -> Result<()> {
    remove_dir(path)?;
    create_dir(path)
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Replace `to` with a copy of the directory `from`.
fn replace_dir(from: &Path, to: &Path) -> Result<()> {
    reset_dir(to)?;
    if !from.exists() {
        return Ok(());
    }
    let mut options = fs_extra::dir::CopyOptions::new();
    options.content_only = true;
    options.overwrite = true;
    fs_extra::dir::copy(from, to, &options)
        .map_err(|err| anyhow::anyhow!(err.to_string()))
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}
