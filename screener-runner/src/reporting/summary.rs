//! Chart- and table-ready views over loaded records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use screener_core::indicators::sma_series;
use screener_core::{QuoteRecord, Sector, SectorTable, MA_LONG, MA_SHORT};

use crate::batch::BatchResult;

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub symbol: String,
    pub price: f64,
    pub volume: u64,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub sector: Sector,
    pub industry: String,
}

/// Rows for every loaded record, in batch order. Failed symbols have no row.
pub fn summary_rows(result: &BatchResult, sectors: &SectorTable) -> Vec<SummaryRow> {
    result
        .records()
        .iter()
        .map(|r| SummaryRow {
            symbol: r.symbol.clone(),
            price: r.last_price,
            volume: r.volume,
            ma20: r.ma20,
            ma50: r.ma50,
            sector: sectors.lookup_sector(&r.symbol),
            industry: sectors.lookup_industry(&r.symbol).to_string(),
        })
        .collect()
}

/// One wedge of the sector pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSlice {
    pub sector: Sector,
    pub count: usize,
    /// Fraction of loaded records, in `0.0..=1.0`.
    pub share: f64,
}

/// Loaded records grouped by sector, largest first (ties by sector order).
pub fn sector_breakdown(result: &BatchResult, sectors: &SectorTable) -> Vec<SectorSlice> {
    let mut counts: BTreeMap<Sector, usize> = BTreeMap::new();
    for record in result.records() {
        *counts.entry(sectors.lookup_sector(&record.symbol)).or_default() += 1;
    }

    let total = result.loaded_count();
    let mut slices: Vec<SectorSlice> = counts
        .into_iter()
        .map(|(sector, count)| SectorSlice {
            sector,
            count,
            share: count as f64 / total as f64,
        })
        .collect();
    slices.sort_by(|a, b| b.count.cmp(&a.count).then(a.sector.cmp(&b.sector)));
    slices
}

/// One candle with the moving averages for that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
}

/// Candles for one record with MA overlays; an MA is absent until enough
/// bars precede it.
pub fn candle_series(record: &QuoteRecord) -> Vec<CandlePoint> {
    let closes = record.closes();
    let short = sma_series(&closes, MA_SHORT);
    let long = sma_series(&closes, MA_LONG);

    record
        .history
        .iter()
        .zip(short.into_iter().zip(long))
        .map(|(bar, (ma20, ma50))| CandlePoint {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            ma20,
            ma50,
        })
        .collect()
}
