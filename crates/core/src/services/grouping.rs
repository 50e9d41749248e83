use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{Icon, ProvenanceChain, Release, ReleaseKind, Summary};

/// Largest icon edge considered for display.
pub const MAX_ICON_SIZE: u32 = 48;

/// Anything with pixel dimensions that can compete in [`select_icon`].
pub trait IconDimensions {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn bpp(&self) -> u32;
}

impl IconDimensions for Icon {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn bpp(&self) -> u32 {
        self.bpp
    }
}

/// Pick the icon to display: square, at most 48 px, then deepest colour and
/// widest. Earlier icons win ties.
pub fn select_icon<T: IconDimensions>(icons: &[T]) -> Option<&T> {
    let mut best: Option<&T> = None;
    for icon in icons {
        if icon.width() != icon.height() || icon.width() > MAX_ICON_SIZE {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => (icon.bpp(), icon.width()) > (current.bpp(), current.width()),
        };
        if better {
            best = Some(icon);
        }
    }
    best
}

/// Icon reference as published with a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseIcon {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub bpp: u32,
}

impl IconDimensions for ReleaseIcon {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn bpp(&self) -> u32 {
        self.bpp
    }
}

impl ReleaseIcon {
    fn from_icon(icon: &Icon) -> Self {
        Self {
            path: format!("icons/{}", icon.filename),
            width: icon.width,
            height: icon.height,
            bpp: icon.bpp,
        }
    }

    pub fn without_depth(&self) -> IconRef {
        IconRef { path: self.path.clone(), width: self.width, height: self.height }
    }
}

/// Icon reference without colour depth, as used by programs, variant items
/// and the group index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// A release as it appears inside a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantItem {
    pub filename: String,
    pub size: u64,
    pub reference: ProvenanceChain,
    pub kind: ReleaseKind,
    pub sha256: String,
    pub uid: String,
    pub name: String,
    pub version: String,
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconRef>,
}

/// Byte-identical releases of one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Shared sha256.
    pub identifier: String,
    pub items: Vec<VariantItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub uid: String,
    pub name: String,
    pub versions: Vec<Version>,
    pub tags: BTreeSet<String>,
    pub kinds: BTreeSet<ReleaseKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconRef>,
}

/// Minimal entry used for search and filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub uid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedIndex {
    pub summary: Summary,
    pub programs: Vec<Program>,
    pub groups: Vec<GroupEntry>,
}

pub fn summarize(releases: &[Release]) -> Summary {
    let uids: HashSet<&str> = releases.iter().map(|r| r.uid.as_str()).collect();
    let versions: HashSet<(&str, &str)> =
        releases.iter().map(|r| (r.uid.as_str(), r.version.as_str())).collect();
    let shas: HashSet<&str> = releases.iter().map(|r| r.sha256.as_str()).collect();
    Summary {
        installer_count: releases.len(),
        uid_count: uids.len(),
        version_count: versions.len(),
        sha_count: shas.len(),
    }
}

/// Group releases into programs, versions and variants.
pub fn group(releases: &[Release]) -> GroupedIndex {
    let summary = summarize(releases);

    let mut programs: Vec<Program> = partition(releases.iter(), |r| r.uid.as_str())
        .into_iter()
        .map(|(uid, members)| build_program(uid, &members))
        .collect();
    programs.sort_by(|a, b| {
        a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.uid.cmp(&b.uid))
    });

    let groups = programs
        .iter()
        .map(|program| GroupEntry {
            uid: program.uid.clone(),
            name: program.name.clone(),
            icon: program.icon.clone(),
        })
        .collect();

    GroupedIndex { summary, programs, groups }
}

/// Stable partition keeping the first-seen order of keys and members.
fn partition<'a, I, K, F>(items: I, key: F) -> Vec<(K, Vec<&'a Release>)>
where
    I: Iterator<Item = &'a Release>,
    K: Eq + std::hash::Hash + Clone,
    F: Fn(&'a Release) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a Release>)> = Vec::new();
    for item in items {
        let k = key(item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}

fn publish(release: &Release) -> (VariantItem, Option<ReleaseIcon>) {
    let icon = select_icon(&release.icons).map(ReleaseIcon::from_icon);
    let item = VariantItem {
        filename: release.filename.clone(),
        size: release.size,
        reference: release.reference.clone(),
        kind: release.kind,
        sha256: release.sha256.clone(),
        uid: release.uid.clone(),
        name: release.name.clone(),
        version: release.version.clone(),
        tags: release.tags.clone(),
        icon: icon.as_ref().map(ReleaseIcon::without_depth),
    };
    (item, icon)
}

fn build_program(uid: &str, releases: &[&Release]) -> Program {
    let published: Vec<(VariantItem, Option<ReleaseIcon>)> =
        releases.iter().map(|r| publish(r)).collect();

    let mut versions: Vec<Version> = partition(releases.iter().copied(), |r| r.version.as_str())
        .into_iter()
        .map(|(version, members)| Version {
            version: version.to_string(),
            variants: partition(members.into_iter(), |r| r.sha256.as_str())
                .into_iter()
                .map(|(sha256, items)| Variant {
                    identifier: sha256.to_string(),
                    items: items.into_iter().map(|r| publish(r).0).collect(),
                })
                .collect(),
        })
        .collect();
    versions.sort_by(|a, b| natural_cmp(&a.version, &b.version));

    let tags = releases.iter().flat_map(|r| r.tags.iter().cloned()).collect();
    let kinds = releases.iter().map(|r| r.kind).collect();

    let release_icons: Vec<ReleaseIcon> =
        published.into_iter().filter_map(|(_, icon)| icon).collect();
    let icon = select_icon(&release_icons).map(ReleaseIcon::without_depth);

    Program {
        uid: uid.to_string(),
        name: releases.first().map(|r| r.name.clone()).unwrap_or_default(),
        versions,
        tags,
        kinds,
        icon,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut digits = None;
    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match digits {
            Some(d) if d != is_digit => {
                out.push(if d { Chunk::Digits(&s[start..i]) } else { Chunk::Text(&s[start..i]) });
                start = i;
            }
            _ => {}
        }
        digits = Some(is_digit);
    }
    if let Some(d) = digits {
        out.push(if d { Chunk::Digits(&s[start..]) } else { Chunk::Text(&s[start..]) });
    }
    out
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Natural ordering: runs of digits compare by value, so `"2.0" < "10.0"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);
    for (x, y) in left.iter().zip(right.iter()) {
        let ordering = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            // Numbers sort ahead of text.
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}
