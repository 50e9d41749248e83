//! Pipeline services.
//!
//! - `releases`: turns walked files into releases.
//! - `grouping`: Program → Version → Variant grouping and icon selection.
//! - `overlay`: merges curated screenshots and descriptions.
//! - `pipeline`: the `sync`, `index`, `group` and `overlay` stages.

pub mod grouping;
pub mod overlay;
pub mod pipeline;
pub mod releases;

pub use grouping::{group, natural_cmp, select_icon, GroupedIndex, Program, Variant, Version};
pub use overlay::{load_overlays, merge, OverlayDocument, OverlayEntry};
pub use releases::{select_name, ImportError, MissingName, ReleaseBuilder};
