use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{info, warn};

use crate::containers::walk;
use crate::model::ReferenceItem;
use crate::sources::resolve::{ArchiveResolver, ReferenceResolver};
use crate::sources::{Assets, Source, SourceDescription, SourceError};

pub(crate) const ARCHIVE_HOST: &str = "archive.org";

/// Download URLs that point inside one of these are not supported.
const NESTED_EXTENSIONS: &[&str] = &["zip", "iso"];

/// An Internet Archive item, or a single file within one.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    url: String,
    id: String,
    item_dir: PathBuf,
    item_metadata_path: PathBuf,
    file_metadata_path: PathBuf,
    path: PathBuf,
}

#[derive(Debug, Default)]
struct ItemMetadata {
    title: Option<String>,
    description: Option<String>,
}

impl ArchiveSource {
    /// Parse an item (`/details/<id>`) or download (`/download/<id>/<path..>`)
    /// URL.
    pub fn new(assets_dir: &Path, url: &str) -> Result<Self, SourceError> {
        let unsupported = || SourceError::UnsupportedUrl(url.to_string());
        let parsed = url::Url::parse(url).map_err(|_| unsupported())?;
        if parsed.host_str() != Some(ARCHIVE_HOST) {
            return Err(unsupported());
        }

        let components: Vec<String> = parsed
            .path_segments()
            .map(|segments| segments.map(str::to_string).collect())
            .unwrap_or_default();

        let (id, relative) = match components.split_first() {
            Some((kind, rest)) if kind == "download" && !rest.is_empty() => {
                let nested = rest[..rest.len() - 1].iter().any(|component| {
                    Path::new(component)
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| {
                            NESTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                        })
                });
                if nested {
                    return Err(unsupported());
                }
                (rest[0].clone(), &rest[1..])
            }
            Some((kind, rest)) if kind == "details" && rest.len() == 1 => (rest[0].clone(), &rest[1..]),
            _ => return Err(unsupported()),
        };
        if id.is_empty() {
            return Err(unsupported());
        }

        let item_dir = assets_dir.join(&id);
        let path = relative.iter().fold(item_dir.clone(), |path, component| path.join(component));
        Ok(Self {
            url: url.to_string(),
            item_metadata_path: item_dir.join(format!("{id}_meta.xml")),
            file_metadata_path: item_dir.join(format!("{id}_files.xml")),
            item_dir,
            path,
            id,
        })
    }

    pub fn details_url(&self) -> String {
        format!("https://{ARCHIVE_HOST}/details/{}", self.id)
    }

    fn mirror_url(&self, file_name: &str) -> String {
        format!("https://{ARCHIVE_HOST}/download/{}/{}", self.id, file_name)
    }

    fn metadata(&self) -> Result<ItemMetadata> {
        let xml = fs::read_to_string(&self.item_metadata_path).map_err(|_| SourceError::NotSynced {
            url: self.url.clone(),
            path: self.item_metadata_path.clone(),
        })?;
        parse_item_metadata(&xml).map_err(|message| {
            SourceError::InvalidMetadata { path: self.item_metadata_path.clone(), message }.into()
        })
    }

    fn title(&self, metadata: &ItemMetadata) -> String {
        metadata.title.clone().unwrap_or_else(|| self.id.clone())
    }

    fn resolver(&self) -> Result<ArchiveResolver> {
        let metadata = self.metadata()?;
        Ok(ArchiveResolver {
            source: ReferenceItem::with_url(self.title(&metadata), self.details_url()),
            url: self.url.clone(),
        })
    }
}

impl Source for ArchiveSource {
    fn url(&self) -> &str {
        &self.url
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn sync(&self) -> Result<()> {
        info!("Syncing '{}'...", self.id);
        fs::create_dir_all(&self.item_dir)
            .with_context(|| format!("Failed to create item directory {}", self.item_dir.display()))?;

        if !self.file_metadata_path.exists() {
            let name = format!("{}_files.xml", self.id);
            warn!("Missing file metadata '{}'; fetch it from {}.", name, self.mirror_url(&name));
        }
        if !self.item_metadata_path.exists() {
            let name = format!("{}_meta.xml", self.id);
            warn!("Missing item metadata '{}'; fetch it from {}.", name, self.mirror_url(&name));
            return Err(SourceError::NotSynced {
                url: self.mirror_url(&name),
                path: self.item_metadata_path.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn assets(&self) -> Result<Assets<'_>> {
        let resolver = self.resolver()?;
        let walker = walk(&self.path, &self.item_dir);
        Ok(Box::new(walker.leaves().map(move |(path, chain)| (path, resolver.resolve(chain)))))
    }

    fn describe(&self) -> Result<SourceDescription> {
        let metadata = self.metadata()?;
        Ok(SourceDescription {
            name: self.title(&metadata),
            description: metadata.description,
            url: Some(self.url.clone()),
            html_url: self.details_url(),
            path: Some(self.path.to_string_lossy().to_string()),
        })
    }
}

/// Pull `title` and `description` out of an item's `_meta.xml`.
fn parse_item_metadata(xml: &str) -> std::result::Result<ItemMetadata, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut metadata = ItemMetadata::default();
    let mut depth = 0usize;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                // Only direct children of the root element.
                current = (depth == 2)
                    .then(|| String::from_utf8_lossy(e.name().as_ref()).to_string());
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                current = None;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| e.to_string())?.to_string();
                match current.as_deref() {
                    Some("title") if metadata.title.is_none() => metadata.title = Some(text),
                    Some("description") if metadata.description.is_none() => {
                        metadata.description = Some(text)
                    }
                    _ => {}
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                if current.as_deref() == Some("description") && metadata.description.is_none() {
                    metadata.description = Some(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("at position {}: {e}", reader.buffer_position())),
            _ => {}
        }
    }
    Ok(metadata)
}
