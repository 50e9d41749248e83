use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::decoder::ToolDecoder;
use crate::library::{load_library_config, resolve_layout, LibraryConfig, LibraryLayout};
use crate::sources::{create_source, Source};

/// Convenience wrapper bundling layout, config and the instantiated sources.
pub struct LibraryContext {
    pub layout: LibraryLayout,
    pub config: LibraryConfig,
    pub sources: Vec<Box<dyn Source>>,
}

impl LibraryContext {
    /// Load the definition at `path` and instantiate its sources.
    ///
    /// Any unsupported source URL aborts loading.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = load_library_config(path)?;
        let layout = resolve_layout(path, &config);
        let sources = config
            .sources
            .iter()
            .map(|url| {
                create_source(&layout.assets_dir, url)
                    .with_context(|| format!("Failed to load source '{url}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layout, config, sources })
    }

    /// Decoder configured for this library.
    pub fn decoder(&self) -> ToolDecoder {
        // Bare command names are looked up on PATH; anything with a separator
        // is relative to the definition file.
        let configured = self.config.decoder_command.as_deref().map(|command| {
            if Path::new(command).components().count() > 1 {
                self.layout.root.join(command)
            } else {
                PathBuf::from(command)
            }
        });
        ToolDecoder::resolve(configured.as_deref())
    }
}
