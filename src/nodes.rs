/*!
 * Node reference catalog and annotation data.
 *
 * Maps node names to localized documentation links, turns mention metadata
 * into timed insertion records, and keeps documentation URLs on the current
 * scheme. The catalog is injected configuration: one shared table, loadable
 * from JSON, with a built-in default set.
 */

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::alignment::Event;
use crate::file_utils::FileManager;
use crate::subtitle_processor::SubtitleEntry;

/// Default offset between a mention and its annotation, in seconds
pub const DEFAULT_INSERT_OFFSET: f64 = 1.0;

// Legacy doc links used the VEX language reference tree
static LEGACY_DOC_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://docs\.sidefx\.com/vex/lang/ja/([^/]+)/([^/]+)$").unwrap()
});

// Node category is the second-to-last path component of a doc link
static NODE_TYPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/([a-z]+)/[^/]+$").unwrap()
});

/// Rewrite a legacy documentation URL onto the current official scheme.
///
/// `https://docs.sidefx.com/vex/lang/ja/{type}/{node}` becomes
/// `https://www.sidefx.com/ja/docs/houdini/nodes/{type}/{node}.html`;
/// anything else passes through unchanged.
pub fn migrate_doc_url(url: &str) -> String {
    match LEGACY_DOC_URL_REGEX.captures(url) {
        Some(caps) => format!(
            "https://www.sidefx.com/ja/docs/houdini/nodes/{}/{}.html",
            &caps[1], &caps[2]
        ),
        None => url.to_string(),
    }
}

/// Extract the node category from a doc link (`/sop/grid.html` gives `SOP`).
/// Returns an empty string when the link carries no recognizable category.
pub fn extract_node_type(doc_link: &str) -> String {
    let lowered = doc_link.to_lowercase();
    let trimmed = lowered.strip_suffix(".html").unwrap_or(&lowered);

    NODE_TYPE_REGEX
        .captures(trimmed)
        .map(|caps| caps[1].to_uppercase())
        .unwrap_or_default()
}

/// One mention record from the analysis metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMention {
    /// Node name as spoken in the tutorial
    pub node_name: String,

    /// Timestamps where the node is mentioned (HH:MM:SS or HH:MM:SS,mmm)
    pub mention_timestamps: Vec<String>,
}

/// Root of the analysis metadata file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentionMetadata {
    /// All node mentions for one chapter
    #[serde(default)]
    pub houdini_nodes: Vec<NodeMention>,
}

impl MentionMetadata {
    /// Load mention metadata from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse mention metadata: {}", path.display()))
    }

    /// Total mention count across all nodes
    pub fn mention_count(&self) -> usize {
        self.houdini_nodes.iter().map(|n| n.mention_timestamps.len()).sum()
    }
}

/// A single annotation record: which node to reference and where
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInsertion {
    /// Node name shown to the reader
    pub node_name: String,

    /// Localized documentation link
    pub doc_link_ja: String,

    /// Annotation position (HH:MM:SS)
    pub insert_after_timestamp: String,
}

/// Shared node-name to documentation-link table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeCatalog {
    /// Node name to doc link
    pub entries: BTreeMap<String, String>,
}

impl NodeCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        NodeCatalog { entries: BTreeMap::new() }
    }

    /// Catalog preloaded with the nodes the tutorial series relies on
    pub fn builtin() -> Self {
        let mut catalog = NodeCatalog::new();
        for (name, slug) in [
            ("Grid", "grid"),
            ("Mountain", "mountain"),
            ("Merge", "merge"),
            ("Curve", "curve"),
            ("Null", "null"),
            ("Resample", "resample"),
            ("Ray", "ray"),
            ("Peak", "peak"),
            ("Convert Line", "convertline"),
            ("Attribute Promote", "attribpromote"),
            ("Split", "split"),
            ("Attribute Randomize", "attribrandomize"),
            ("Group by Range", "grouprange"),
            ("For Each Primitive", "foreach"),
            ("Attribute Wrangle", "attribwrangle"),
            ("Group", "group"),
            ("Fuse", "fuse"),
            ("Color", "color"),
            ("Box", "box"),
            ("Copy to Points", "copytopoints"),
            ("Orient Along Curve", "orientalongcurve"),
            ("Attribute Create", "attribcreate"),
            ("Attribute Noise", "attribnoise"),
        ] {
            catalog.entries.insert(name.to_string(), Self::official_doc_url(slug));
        }
        catalog
    }

    /// Load a catalog from a JSON file (name to link map), migrating legacy
    /// links and dropping entries whose link does not parse as a URL
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        let raw: BTreeMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse node catalog: {}", path.display()))?;

        let mut catalog = NodeCatalog::new();
        let mut dropped = 0usize;
        for (name, link) in raw {
            let migrated = migrate_doc_url(&link);
            match Url::parse(&migrated) {
                Ok(_) => {
                    catalog.entries.insert(name, migrated);
                }
                Err(e) => {
                    warn!("Dropping catalog entry {:?}: invalid doc link {:?} ({})", name, link, e);
                    dropped += 1;
                }
            }
        }

        if dropped > 0 {
            warn!("Dropped {} invalid catalog entries from {}", dropped, path.display());
        }
        debug!("Loaded node catalog with {} entries from {}", catalog.entries.len(), path.display());

        Ok(catalog)
    }

    /// Add or replace a catalog entry
    pub fn add(&mut self, name: impl Into<String>, doc_link: impl Into<String>) {
        self.entries.insert(name.into(), doc_link.into());
    }

    /// Documentation link for a node. Unknown nodes fall back to a link
    /// derived from the lowercased, space-stripped node name.
    pub fn doc_link(&self, node_name: &str) -> String {
        match self.entries.get(node_name) {
            Some(link) => link.clone(),
            None => {
                let slug = node_name.to_lowercase().replace(' ', "");
                Self::official_doc_url(&slug)
            }
        }
    }

    /// Number of cataloged nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn official_doc_url(slug: &str) -> String {
        format!("https://www.sidefx.com/ja/docs/houdini/nodes/sop/{}.html", slug)
    }
}

/// Expand mention metadata into one insertion per mention, positioned
/// `insert_offset_secs` after the spoken mention.
///
/// Malformed timestamps are dropped with a warning count; the rest of the
/// metadata is still processed.
pub fn generate_insertions(
    metadata: &MentionMetadata,
    catalog: &NodeCatalog,
    insert_offset_secs: f64,
) -> (Vec<NodeInsertion>, usize) {
    let offset_ms = (insert_offset_secs * 1000.0).round() as i64;
    let mut insertions = Vec::new();
    let mut skipped = 0usize;

    for mention in &metadata.houdini_nodes {
        let doc_link = catalog.doc_link(&mention.node_name);

        for timestamp in &mention.mention_timestamps {
            let time_ms = match SubtitleEntry::parse_timestamp_flexible(timestamp) {
                Ok(ms) => ms,
                Err(e) => {
                    warn!(
                        "Skipping mention of {:?} with malformed timestamp {:?}: {}",
                        mention.node_name, timestamp, e
                    );
                    skipped += 1;
                    continue;
                }
            };

            let insert_ms = (time_ms as i64 + offset_ms).max(0) as u64;

            insertions.push(NodeInsertion {
                node_name: mention.node_name.clone(),
                doc_link_ja: doc_link.clone(),
                insert_after_timestamp: SubtitleEntry::format_timestamp_short(insert_ms),
            });
        }
    }

    if skipped > 0 {
        warn!("Skipped {} mentions with malformed timestamps", skipped);
    }

    (insertions, skipped)
}

/// Convert insertion records into alignment events. Malformed records are
/// dropped with a warning count.
pub fn insertions_to_events(insertions: &[NodeInsertion]) -> (Vec<Event>, usize) {
    let mut events = Vec::with_capacity(insertions.len());
    let mut skipped = 0usize;

    for insertion in insertions {
        match SubtitleEntry::parse_timestamp_flexible(&insertion.insert_after_timestamp) {
            Ok(time_ms) => {
                let event = Event::new(time_ms, insertion.node_name.clone())
                    .with_payload(json!({ "doc_link_ja": insertion.doc_link_ja }));
                events.push(event);
            }
            Err(e) => {
                warn!(
                    "Skipping insertion for {:?} with malformed timestamp {:?}: {}",
                    insertion.node_name, insertion.insert_after_timestamp, e
                );
                skipped += 1;
            }
        }
    }

    (events, skipped)
}

/// Load insertion records from a JSON file, migrating legacy doc links
pub fn load_insertions<P: AsRef<Path>>(path: P) -> Result<Vec<NodeInsertion>> {
    let path = path.as_ref();
    let content = FileManager::read_to_string(path)?;
    let mut insertions: Vec<NodeInsertion> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse node insertions: {}", path.display()))?;

    let migrated = migrate_insertion_links(&mut insertions);
    if migrated > 0 {
        info!("Migrated {} legacy doc links in {}", migrated, path.display());
    }

    Ok(insertions)
}

/// Save insertion records as pretty-printed JSON
pub fn save_insertions<P: AsRef<Path>>(path: P, insertions: &[NodeInsertion]) -> Result<()> {
    let json = serde_json::to_string_pretty(insertions)?;
    FileManager::write_to_file(path, &json)
}

/// Rewrite legacy doc links in place, returning how many changed
pub fn migrate_insertion_links(insertions: &mut [NodeInsertion]) -> usize {
    let mut changed = 0usize;
    for insertion in insertions.iter_mut() {
        let migrated = migrate_doc_url(&insertion.doc_link_ja);
        if migrated != insertion.doc_link_ja {
            debug!(
                "Migrating doc link for {}: {} -> {}",
                insertion.node_name, insertion.doc_link_ja, migrated
            );
            insertion.doc_link_ja = migrated;
            changed += 1;
        }
    }
    changed
}

/// Repair an insertion file on disk, rewriting it only when links changed.
/// Returns the number of migrated links.
pub fn repair_insertion_file<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let mut insertions = load_insertions_unmigrated(path)?;

    let changed = migrate_insertion_links(&mut insertions);
    if changed > 0 {
        save_insertions(path, &insertions)?;
        info!("Fixed {} doc links in {}", changed, path.display());
    } else {
        info!("No legacy doc links in {}", path.display());
    }

    Ok(changed)
}

fn load_insertions_unmigrated(path: &Path) -> Result<Vec<NodeInsertion>> {
    let content = FileManager::read_to_string(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse node insertions: {}", path.display()))
}
