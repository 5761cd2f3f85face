//! Metadata ledger: placeholder token → content type and source URL.
//!
//! One JSON object per archive directory, shared by every page archived
//! into it. Keys stay sorted so reruns produce identical files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// What the render pass needs to know about one archived asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    /// Bare media type the server reported at fetch time.
    pub content_type: String,
    /// Canonical URL the asset was fetched from.
    pub url: String,
}

/// The in-memory ledger, keyed by placeholder token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, AssetMeta>,
}

impl Ledger {
    /// Load the ledger at `path`. Errors when the file is missing; use
    /// [`Ledger::load_or_default`] where an empty archive is acceptable.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("read ledger {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("malformed ledger {}", path.display()))
    }

    /// Load the ledger at `path`, or start empty when none exists yet.
    /// Archiving into a shared directory merges with earlier passes
    /// instead of clobbering their entries.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Ledger::default());
        }
        Self::load(path)
    }

    pub fn insert(&mut self, token: String, meta: AssetMeta) {
        self.entries.insert(token, meta);
    }

    pub fn get(&self, token: &str) -> Option<&AssetMeta> {
        self.entries.get(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AssetMeta)> {
        self.entries.iter()
    }

    /// Write the ledger as one pretty-printed JSON object, sorted keys.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries).context("serialize ledger")?;
        fs::write(path, json).with_context(|| format!("write ledger {}", path.display()))
    }
}
