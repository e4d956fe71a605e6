//! CSV and JSON export of batch results.
//!
//! - **Summary CSV**: one row per loaded symbol (the table view)
//! - **History CSV**: daily bars with MA overlays for one symbol
//! - **JSON**: the whole `BatchResult` plus its accounting counts

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use screener_core::{QuoteRecord, SectorTable};

use super::summary::{candle_series, summary_rows};
use crate::batch::{BatchResult, SymbolFailure};

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_default()
}

/// Columns: symbol, price, volume, ma20, ma50, sector, industry.
/// Absent moving averages are empty cells.
pub fn export_summary_csv(result: &BatchResult, sectors: &SectorTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol", "price", "volume", "ma20", "ma50", "sector", "industry"])?;

    for row in summary_rows(result, sectors) {
        wtr.write_record([
            row.symbol,
            format!("{:.4}", row.price),
            row.volume.to_string(),
            opt(row.ma20),
            opt(row.ma50),
            row.sector.name().to_string(),
            row.industry,
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Columns: date, open, high, low, close, volume, ma20, ma50.
pub fn export_history_csv(record: &QuoteRecord) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "open", "high", "low", "close", "volume", "ma20", "ma50"])?;

    for c in candle_series(record) {
        wtr.write_record([
            c.date.to_string(),
            format!("{:.4}", c.open),
            format!("{:.4}", c.high),
            format!("{:.4}", c.low),
            format!("{:.4}", c.close),
            c.volume.to_string(),
            opt(c.ma20),
            opt(c.ma50),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

#[derive(Serialize)]
struct BatchReport<'a> {
    summary: String,
    requested_symbols: &'a [String],
    loaded_count: usize,
    skipped_count: usize,
    available_count: usize,
    content_hash: String,
    records: &'a [QuoteRecord],
    failures: &'a [SymbolFailure],
}

/// Pretty JSON of the whole result, including the derived counts.
pub fn export_json(result: &BatchResult) -> Result<String> {
    let report = BatchReport {
        summary: result.summary_line(),
        requested_symbols: result.requested_symbols(),
        loaded_count: result.loaded_count(),
        skipped_count: result.skipped_count(),
        available_count: result.available_count(),
        content_hash: result.content_hash(),
        records: result.records(),
        failures: result.failures(),
    };
    serde_json::to_string_pretty(&report).context("failed to serialize BatchResult to JSON")
}

/// Write an export to `path`, creating parent directories.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
