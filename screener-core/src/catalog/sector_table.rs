//! Sector database: static symbol → (sector, industry) lookup.
//!
//! The table is read once and never mutated. Lookups are total: a symbol
//! absent from the table resolves to `Sector::Unknown` / `"Unknown"`.

use super::CatalogError;
use crate::domain::Sector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const BUILTIN_DATABASE: &str = include_str!("../../data/sector_database.json");

/// Industry label returned for symbols without an entry.
pub const UNKNOWN_INDUSTRY: &str = "Unknown";

/// On-disk shape of one database entry. Sector names are kept as text so an
/// unrecognised name degrades to `Unknown` instead of rejecting the file.
#[derive(Debug, Deserialize)]
struct RawEntry {
    sector: String,
    #[serde(default)]
    industry: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorEntry {
    pub sector: Sector,
    pub industry: String,
}

#[derive(Debug, Clone, Default)]
pub struct SectorTable {
    entries: HashMap<String, SectorEntry>,
}

impl SectorTable {
    /// An empty table: every symbol resolves to `Unknown`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The 138-entry table shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_DATABASE).expect("built-in sector database is valid JSON")
    }

    /// Parse a `{"SYM": {"sector": "...", "industry": "..."}}` document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, RawEntry> = serde_json::from_str(json)?;
        let mut entries = HashMap::with_capacity(raw.len());
        for (symbol, entry) in raw {
            let sector = Sector::from_name_lossy(&entry.sector);
            if !sector.is_known() && !entry.sector.eq_ignore_ascii_case("unknown") {
                log::warn!("sector database: unrecognised sector '{}' for {symbol}", entry.sector);
            }
            let industry = if entry.industry.trim().is_empty() {
                UNKNOWN_INDUSTRY.to_string()
            } else {
                entry.industry
            };
            entries.insert(symbol.trim().to_ascii_uppercase(), SectorEntry { sector, industry });
        }
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Build a table from in-memory entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, SectorEntry)>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(s, e)| (s.as_ref().trim().to_ascii_uppercase(), e))
                .collect(),
        }
    }

    pub fn lookup_sector(&self, symbol: &str) -> Sector {
        self.get(symbol).map(|e| e.sector).unwrap_or(Sector::Unknown)
    }

    pub fn lookup_industry(&self, symbol: &str) -> &str {
        self.get(symbol)
            .map(|e| e.industry.as_str())
            .unwrap_or(UNKNOWN_INDUSTRY)
    }

    pub fn get(&self, symbol: &str) -> Option<&SectorEntry> {
        match self.entries.get(symbol) {
            Some(entry) => Some(entry),
            None => self.entries.get(&symbol.trim().to_ascii_uppercase()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of table entries per sector.
    pub fn sector_counts(&self) -> BTreeMap<Sector, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.sector).or_insert(0) += 1;
        }
        counts
    }
}
