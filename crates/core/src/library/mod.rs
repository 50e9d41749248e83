//! Library definition and on-disk layout.
//!
//! A library is described by a YAML definition file listing its sources,
//! overlay directories and working directories. From it we derive:
//! - `LibraryConfig`: the serializable definition.
//! - `LibraryLayout`: every path the pipeline reads or writes.
//! - `LibraryContext`: config + layout + instantiated sources.

mod config;
mod context;
mod layout;
mod util;

pub use config::LibraryConfig;
pub use context::LibraryContext;
pub use layout::LibraryLayout;
pub use util::{load_library_config, resolve_layout, save_library_config, ASSETS_DIRECTORY_ENV};
