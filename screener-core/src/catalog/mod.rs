//! Ticker catalog: the read-only universe of listed equities plus the
//! sector table, with exchange / starting-letter / sector filtering.
//!
//! The catalog is built once at startup and handed to consumers by
//! reference; nothing in it is mutated afterwards.

pub mod sector_table;
pub mod symbol_directory;

pub use sector_table::{SectorEntry, SectorTable, UNKNOWN_INDUSTRY};
pub use symbol_directory::{
    load_ticker_universe, parse_symbol_directory, DirectorySource, UniverseSource,
    NASDAQ_LISTED_URL, OTHER_LISTED_URL,
};

use crate::domain::{Exchange, Sector, TickerRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the universe or the sector database.
///
/// All of these are startup conditions; none occur per request.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("parse sector database: {0}")]
    SectorDatabase(#[from] serde_json::Error),

    #[error("ticker universe unreadable: {0}")]
    Unreadable(String),
}

/// Filter over the three catalog dimensions.
///
/// An empty set means "no restriction" on that dimension, not "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerFilter {
    pub exchanges: BTreeSet<Exchange>,
    pub letters: BTreeSet<char>,
    pub sectors: BTreeSet<Sector>,
}

impl TickerFilter {
    /// A filter that passes every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_exchanges(mut self, exchanges: impl IntoIterator<Item = Exchange>) -> Self {
        self.exchanges.extend(exchanges);
        self
    }

    /// Letters are compared case-insensitively.
    pub fn with_letters(mut self, letters: impl IntoIterator<Item = char>) -> Self {
        self.letters
            .extend(letters.into_iter().map(|c| c.to_ascii_uppercase()));
        self
    }

    pub fn with_sectors(mut self, sectors: impl IntoIterator<Item = Sector>) -> Self {
        self.sectors.extend(sectors);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.exchanges.is_empty() && self.letters.is_empty() && self.sectors.is_empty()
    }

    /// True if `record` satisfies all three predicates.
    pub fn matches(&self, record: &TickerRecord, sectors: &SectorTable) -> bool {
        if !self.exchanges.is_empty() && !self.exchanges.contains(&record.exchange) {
            return false;
        }
        if !self.letters.is_empty() {
            let Some(initial) = record.initial() else {
                return false;
            };
            if !self
                .letters
                .iter()
                .any(|l| l.to_ascii_uppercase() == initial)
            {
                return false;
            }
        }
        if !self.sectors.is_empty() && !self.sectors.contains(&sectors.lookup_sector(&record.symbol)) {
            return false;
        }
        true
    }
}

/// Immutable ticker universe with its sector table.
#[derive(Debug, Clone)]
pub struct TickerCatalog {
    records: Vec<TickerRecord>,
    sectors: SectorTable,
}

impl TickerCatalog {
    /// Build a catalog. Blank symbols are dropped, duplicates keep their first
    /// occurrence, and records are ordered alphabetically by symbol.
    pub fn new(records: Vec<TickerRecord>, sectors: SectorTable) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut records: Vec<TickerRecord> = records
            .into_iter()
            .filter(|r| !r.symbol.is_empty() && seen.insert(r.symbol.clone()))
            .collect();
        records.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Self { records, sectors }
    }

    /// Load both directory files and build the catalog.
    pub fn load(source: &UniverseSource, sectors: SectorTable) -> Result<Self, CatalogError> {
        let records = load_ticker_universe(source)?;
        Ok(Self::new(records, sectors))
    }

    pub fn records(&self) -> &[TickerRecord] {
        &self.records
    }

    pub fn sectors(&self) -> &SectorTable {
        &self.sectors
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&TickerRecord> {
        self.records
            .binary_search_by(|r| r.symbol.as_str().cmp(symbol))
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn lookup_sector(&self, symbol: &str) -> Sector {
        self.sectors.lookup_sector(symbol)
    }

    /// All records passing `filter`, in catalog order. May be empty.
    pub fn filter(&self, filter: &TickerFilter) -> Vec<&TickerRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(r, &self.sectors))
            .collect()
    }

    /// Symbols of the records passing `filter`, in catalog order.
    pub fn filter_symbols(&self, filter: &TickerFilter) -> Vec<String> {
        self.filter(filter)
            .into_iter()
            .map(|r| r.symbol.clone())
            .collect()
    }

    /// Exchanges present in the catalog.
    pub fn exchanges(&self) -> BTreeSet<Exchange> {
        self.records.iter().map(|r| r.exchange).collect()
    }

    /// Named sectors that at least one catalog member resolves to.
    pub fn available_sectors(&self) -> Vec<Sector> {
        let present: BTreeSet<Sector> = self
            .records
            .iter()
            .map(|r| self.sectors.lookup_sector(&r.symbol))
            .filter(Sector::is_known)
            .collect();
        present.into_iter().collect()
    }
}
