//! Raw identifier → display name mapping.
//!
//! Device exports identify appliances by management IP. Operators give them
//! friendly names by editing a small JSON file:
//!
//! ```json
//! {
//!   "10.74.224.50": "EU-Edge-1",
//!   "10.74.224.51": "10.74.224.51"
//! }
//! ```
//!
//! The store is loaded once at the start of a run, collects identifiers the
//! report encounters that have no entry yet, and writes them back (mapped
//! to themselves) at the end. Existing entries are never removed or changed
//! by a run, and keys are written sorted so unchanged mappings produce an
//! unchanged file.

use crate::utils::output::write_atomically;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Persisted mapping with load / mutate / save lifecycle.
///
/// The file content is kept verbatim for saving; lookups go through a
/// cleaned copy. Entries whose name is blank count as known but resolve to
/// the raw identifier.
#[derive(Debug, Clone, Default)]
pub struct NameStore {
    path: PathBuf,
    persisted: BTreeMap<String, String>,
    entries: BTreeMap<String, String>,
    known: BTreeSet<String>,
    discovered: BTreeSet<String>,
}

fn clean(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

impl NameStore {
    /// Load the mapping file; a missing file is an empty mapping.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::from_entries(path, BTreeMap::new()));
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read name mapping: {}", path.display()))?;
        let raw: BTreeMap<String, String> = if text.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse name mapping JSON: {}", path.display()))?
        };

        Ok(Self::from_entries(path, raw))
    }

    /// Build a store from file entries.
    ///
    /// Lookups ignore blank keys or names and surrounding quotes; the
    /// entries themselves are written back unchanged.
    pub fn from_entries(path: impl Into<PathBuf>, persisted: BTreeMap<String, String>) -> Self {
        let known: BTreeSet<String> = persisted
            .keys()
            .map(|k| clean(k))
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        let entries = persisted
            .iter()
            .map(|(k, v)| (clean(k), clean(v)))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            path: path.into(),
            persisted,
            entries,
            known,
            discovered: BTreeSet::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    /// Usable mappings: cleaned keys with non-blank names.
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Identifiers seen this run that have no entry yet.
    pub fn discovered(&self) -> impl Iterator<Item = &str> {
        self.discovered.iter().map(String::as_str)
    }

    fn note(&mut self, raw: &str) {
        if !self.known.contains(raw) {
            self.discovered.insert(raw.to_string());
        }
    }

    /// Persist newly discovered identifiers.
    ///
    /// Existing file entries are written back as loaded. Returns
    /// `Ok(false)` without touching the file when nothing new was seen.
    pub fn save(&mut self) -> Result<bool> {
        if self.discovered.is_empty() {
            return Ok(false);
        }

        for raw in std::mem::take(&mut self.discovered) {
            self.known.insert(raw.clone());
            self.entries.entry(raw.clone()).or_insert_with(|| raw.clone());
            self.persisted.entry(raw.clone()).or_insert(raw);
        }

        let mut json = serde_json::to_string_pretty(&self.persisted)
            .context("Failed to serialize name mapping")?;
        json.push('\n');
        write_atomically(&self.path, json.as_bytes())?;
        Ok(true)
    }
}

/// Resolves identifiers through a [`NameStore`], noting unknown ones.
pub struct NameResolver<'a> {
    store: &'a mut NameStore,
}

impl<'a> NameResolver<'a> {
    pub fn new(store: &'a mut NameStore) -> Self {
        Self { store }
    }

    /// Display name for `raw`, or `raw` itself when unmapped.
    pub fn resolve(&mut self, raw: &str) -> String {
        self.store.note(raw);
        self.store.get(raw).unwrap_or(raw).to_string()
    }
}
