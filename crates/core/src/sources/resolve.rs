use url::form_urlencoded;

use crate::model::{ProvenanceChain, ReferenceItem};

/// Rewrites a raw provenance chain into one with usable URLs.
pub trait ReferenceResolver {
    fn resolve(&self, chain: ProvenanceChain) -> ProvenanceChain;
}

/// Resolver for archive items.
///
/// The item itself and its top-level containers are browsable at the archive;
/// anything deeper has no URL of its own.
#[derive(Debug, Clone)]
pub struct ArchiveResolver {
    /// Identity of the source (item title + details page).
    pub source: ReferenceItem,
    /// URL the source was configured with.
    pub url: String,
}

impl ReferenceResolver for ArchiveResolver {
    fn resolve(&self, chain: ProvenanceChain) -> ProvenanceChain {
        let mut resolved = vec![self.source.clone()];
        let mut items = chain.into_iter();

        if let Some(root) = items.next() {
            resolved.push(ReferenceItem::with_url(root.name, self.url.clone()));
        }
        if let Some(first_tier) = items.next() {
            let encoded: String = form_urlencoded::byte_serialize(first_tier.name.as_bytes()).collect();
            let url = format!("{}/{}", self.url, encoded);
            resolved.push(ReferenceItem::with_url(first_tier.name, url));
        }
        resolved.extend(items);
        resolved
    }
}

/// Resolver for website snapshots.
///
/// Walks start at the snapshot's contents archive, so the first chain entry is
/// that archive and is replaced by the source identity. The next entry maps to
/// a file on the mirrored site.
#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    pub source: ReferenceItem,
    /// Original URL of the mirrored site.
    pub site_url: String,
}

impl ReferenceResolver for SnapshotResolver {
    fn resolve(&self, chain: ProvenanceChain) -> ProvenanceChain {
        let mut resolved = vec![self.source.clone()];
        let mut items = chain.into_iter().skip(1);

        if let Some(first) = items.next() {
            let url = format!("{}/{}", self.site_url, first.name);
            resolved.push(ReferenceItem::with_url(first.name, url));
        }
        resolved.extend(items);
        resolved
    }
}
