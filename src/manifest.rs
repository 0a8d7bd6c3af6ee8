//! Generation manifest: which items already have photos, and how they
//! were made.
//!
//! The manifest is read once at startup and rewritten in full after every
//! successful item, so an interrupted run loses at most the item in flight.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Timestamp format used for `generated` fields.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Time of the last save; `null` before the first one.
    #[serde(default)]
    pub generated: Option<String>,
    /// Number of entries. Recomputed on every save.
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub items: BTreeMap<String, ManifestEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    /// Exact prompt sent to the image service.
    pub prompt: String,
    pub generated: String,
    pub full_size: u64,
    pub thumb_size: u64,
    #[serde(default)]
    pub revised_prompt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Load the manifest at `path`; a missing file yields an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    /// Stamp, recount and write the manifest as pretty-printed JSON.
    ///
    /// Writes to a sibling temp file first and renames it into place.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.generated = Some(now_timestamp());
        self.count = self.items.len();

        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write manifest: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace manifest: {}", path.display()))?;
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Insert or replace the entry for `id`, returning the one it replaced.
    pub fn record(&mut self, id: &str, entry: ManifestEntry) -> Option<ManifestEntry> {
        self.items.insert(id.to_string(), entry)
    }

    pub fn remove(&mut self, id: &str) -> Option<ManifestEntry> {
        self.items.remove(id)
    }
}

/// Current UTC time in [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
