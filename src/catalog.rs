//! Static character catalog players pick their avatars from.
//!
//! The records live in `characters.json`, embedded at compile time and parsed
//! once on first access. Only chosen records are ever persisted.

use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One selectable character. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: u32,
    pub name: String,
    /// Asset path relative to the served root.
    pub image: String,
    /// Frame color name (`gold`, `silver`, ...).
    pub color: String,
    /// Background zoom in percent.
    pub zoom: u16,
    /// CSS `background-position` value used to crop the portrait.
    pub position: String,
}

impl CharacterRecord {
    /// Inline CSS for the portrait element.
    pub fn portrait_style(&self) -> String {
        format!(
            "background-image: url('{}'); background-size: {}%; background-position: {};",
            self.image, self.zoom, self.position
        )
    }
}

static CATALOG: Lazy<Vec<CharacterRecord>> =
    Lazy::new(|| parse_catalog(include_str!("characters.json")));

/// Parse a JSON catalog, dropping records whose id repeats an earlier one.
pub fn parse_catalog(json: &str) -> Vec<CharacterRecord> {
    let records: Vec<CharacterRecord> = match serde_json::from_str(json) {
        Ok(records) => records,
        Err(e) => {
            warn!("Character catalog could not be parsed: {}", e);
            return Vec::new();
        }
    };

    let mut seen = std::collections::HashSet::new();
    let catalog: Vec<CharacterRecord> = records
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.id);
            if !fresh {
                warn!("Duplicate character id {} in catalog, skipping", record.id);
            }
            fresh
        })
        .collect();

    info!("Loaded {} characters", catalog.len());
    catalog
}

/// The built-in catalog.
pub fn catalog() -> &'static [CharacterRecord] {
    &CATALOG
}

/// Look up a record by id in `records`.
pub fn find(records: &[CharacterRecord], id: u32) -> Option<&CharacterRecord> {
    records.iter().find(|record| record.id == id)
}
