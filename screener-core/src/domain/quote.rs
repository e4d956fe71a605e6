//! QuoteRecord: the normalized result of one successful fetch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Latest quote plus history for one symbol.
///
/// Created fresh per fetch and never mutated afterwards. Moving averages are
/// computed locally from `history`; a field is `None` when fewer than n bars
/// were available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub symbol: String,
    pub last_price: f64,
    pub volume: u64,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    /// Ascending by date.
    pub history: Vec<DailyBar>,
    pub fetched_at: DateTime<Utc>,
}

impl QuoteRecord {
    pub fn closes(&self) -> Vec<f64> {
        self.history.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.history.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.history.last().map(|b| b.date)
    }
}
