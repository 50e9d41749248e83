use std::path::{Path, PathBuf};

use crate::library::LibraryConfig;

/// Logical layout of a library on disk.
///
/// This is derived from the definition file location and its config. It does
/// *not* perform any IO itself; the pipeline stages create what they need.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    /// Path to the library definition (YAML).
    pub definition_path: PathBuf,
    /// Directory containing the definition; relative entries resolve here.
    pub root: PathBuf,
    /// Directory holding synced sources.
    pub assets_dir: PathBuf,
    /// Overlay directories, in definition order.
    pub overlay_dirs: Vec<PathBuf>,

    /// Output of the `index` stage.
    pub intermediates_dir: PathBuf,
    /// Intermediate release index (releases.json).
    pub releases_path: PathBuf,
    /// Content-addressed release files (intermediates/files).
    pub files_dir: PathBuf,
    /// Content-addressed icons (intermediates/icons).
    pub icons_dir: PathBuf,
    /// Files that failed to decode (intermediates/errors).
    pub errors_dir: PathBuf,

    /// Output of the `group` stage.
    pub index_dir: PathBuf,
    pub summary_path: PathBuf,
    pub sources_path: PathBuf,
    pub programs_path: PathBuf,
    pub groups_path: PathBuf,
    pub index_files_dir: PathBuf,
    pub index_icons_dir: PathBuf,

    /// Published tree written by the `overlay` stage.
    pub output_dir: PathBuf,
    /// Site data files (output/_data).
    pub data_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub output_files_dir: PathBuf,
    pub output_icons_dir: PathBuf,
    /// Static API mirror (output/api/v1).
    pub api_dir: PathBuf,
}

impl LibraryLayout {
    /// Compute the layout for the definition at `definition_path`.
    ///
    /// This does *not* touch the filesystem.
    pub fn new(definition_path: impl AsRef<Path>, config: &LibraryConfig) -> Self {
        let definition_path = definition_path.as_ref().to_path_buf();
        let root = definition_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let resolve = |entry: &str| root.join(entry);

        let assets_dir = resolve(&config.assets_directory);
        let overlay_dirs = config.overlays.iter().map(|o| resolve(o)).collect();

        let intermediates_dir = resolve(&config.intermediates_directory);
        let releases_path = intermediates_dir.join("releases.json");
        let files_dir = intermediates_dir.join("files");
        let icons_dir = intermediates_dir.join("icons");
        let errors_dir = intermediates_dir.join("errors");

        let index_dir = resolve(&config.index_directory);
        let summary_path = index_dir.join("summary.json");
        let sources_path = index_dir.join("sources.json");
        let programs_path = index_dir.join("programs.json");
        let groups_path = index_dir.join("groups.json");
        let index_files_dir = index_dir.join("files");
        let index_icons_dir = index_dir.join("icons");

        let output_dir = resolve(&config.output_directory);
        let data_dir = output_dir.join("_data");
        let screenshots_dir = output_dir.join("screenshots");
        let output_files_dir = output_dir.join("files");
        let output_icons_dir = output_dir.join("icons");
        let api_dir = output_dir.join("api").join("v1");

        Self {
            definition_path,
            root,
            assets_dir,
            overlay_dirs,
            intermediates_dir,
            releases_path,
            files_dir,
            icons_dir,
            errors_dir,
            index_dir,
            summary_path,
            sources_path,
            programs_path,
            groups_path,
            index_files_dir,
            index_icons_dir,
            output_dir,
            data_dir,
            screenshots_dir,
            output_files_dir,
            output_icons_dir,
            api_dir,
        }
    }

    /// Replace the assets directory (used for the environment override).
    pub fn with_assets_dir(mut self, assets_dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = assets_dir.into();
        self
    }

    /// Path of one API collection document, e.g. `api/v1/programs/index.json`.
    pub fn api_index_path(&self, collection: &str) -> PathBuf {
        self.api_dir.join(collection).join("index.json")
    }

    /// Screenshot directory for one program in the published tree.
    pub fn program_screenshots_dir(&self, uid: &str) -> PathBuf {
        self.screenshots_dir.join(uid)
    }
}
