//! NASDAQ Trader symbol directory files.
//!
//! `nasdaqlisted.txt` lists NASDAQ securities; `otherlisted.txt` lists every
//! other venue, which the screener reports as NYSE. Both are pipe-delimited
//! with a header line and a trailing `File Creation Time:` footer.

use super::CatalogError;
use crate::domain::{Exchange, TickerRecord};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

pub const NASDAQ_LISTED_URL: &str = "https://www.nasdaqtrader.com/dynamic/symdir/nasdaqlisted.txt";
pub const OTHER_LISTED_URL: &str = "https://www.nasdaqtrader.com/dynamic/symdir/otherlisted.txt";

const FOOTER_PREFIX: &str = "File Creation Time";

/// Where one directory file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorySource {
    File(PathBuf),
    Url(String),
}

impl DirectorySource {
    fn describe(&self) -> String {
        match self {
            DirectorySource::File(p) => p.display().to_string(),
            DirectorySource::Url(u) => u.clone(),
        }
    }
}

/// The two directory files that make up the universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseSource {
    pub nasdaq: DirectorySource,
    pub other: DirectorySource,
}

impl UniverseSource {
    /// The public NASDAQ Trader endpoints.
    pub fn remote() -> Self {
        Self {
            nasdaq: DirectorySource::Url(NASDAQ_LISTED_URL.into()),
            other: DirectorySource::Url(OTHER_LISTED_URL.into()),
        }
    }

    pub fn from_files(nasdaq: impl Into<PathBuf>, other: impl Into<PathBuf>) -> Self {
        Self {
            nasdaq: DirectorySource::File(nasdaq.into()),
            other: DirectorySource::File(other.into()),
        }
    }
}

/// Parse one directory file, tagging every row with `exchange`.
///
/// Skips the header, the footer, blank lines and rows with fewer than two
/// columns. Column 0 is the symbol, column 1 the security name.
pub fn parse_symbol_directory(text: &str, exchange: Exchange) -> Vec<TickerRecord> {
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with(FOOTER_PREFIX) {
            continue;
        }
        if i == 0 && line.contains("Symbol") {
            continue;
        }
        let mut parts = line.split('|');
        let (Some(symbol), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        let symbol = symbol.trim();
        if symbol.is_empty() || symbol.contains(char::is_whitespace) {
            continue;
        }
        records.push(TickerRecord::new(symbol, exchange, name));
    }
    records
}

/// Load the full universe from both directory files.
///
/// A source that cannot be read is logged and skipped. The load fails only
/// when no source yields any record, which callers treat as fatal.
pub fn load_ticker_universe(source: &UniverseSource) -> Result<Vec<TickerRecord>, CatalogError> {
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for (dir, exchange) in [(&source.nasdaq, Exchange::Nasdaq), (&source.other, Exchange::Nyse)] {
        match read_source(dir) {
            Ok(text) => {
                let parsed = parse_symbol_directory(&text, exchange);
                log::info!("loaded {} {exchange} tickers from {}", parsed.len(), dir.describe());
                records.extend(parsed);
            }
            Err(e) => {
                log::warn!("error loading {exchange} tickers: {e}");
                failures.push(e.to_string());
            }
        }
    }

    if records.is_empty() {
        let reason = if failures.is_empty() {
            "symbol directories contained no tickers".to_string()
        } else {
            failures.join("; ")
        };
        return Err(CatalogError::Unreadable(reason));
    }

    Ok(dedupe(records))
}

fn dedupe(records: Vec<TickerRecord>) -> Vec<TickerRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.symbol.clone()))
        .collect()
}

fn read_source(source: &DirectorySource) -> Result<String, CatalogError> {
    match source {
        DirectorySource::File(path) => {
            std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
                path: path.clone(),
                source: e,
            })
        }
        DirectorySource::Url(url) => {
            let download = |reason: String| CatalogError::Download {
                url: url.clone(),
                reason,
            };
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| download(e.to_string()))?;
            let resp = client.get(url).send().map_err(|e| download(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(download(format!("HTTP {}", resp.status())));
            }
            resp.text().map_err(|e| download(e.to_string()))
        }
    }
}
