//! curator-core
//!
//! Core library for curating a software archive: walking nested containers,
//! resolving provenance, decoding releases, grouping them into programs and
//! merging curated overlays.
//!
//! All substantive logic lives here so it is testable and reusable from
//! multiple frontends; the `archive-curator` binary is a thin shell over it.

pub mod containers;
pub mod decoder;
pub mod library;
pub mod model;
pub mod services;
pub mod sources;
pub mod store;
