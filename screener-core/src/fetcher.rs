//! Market data fetcher: one symbol in, one `QuoteRecord` or one typed
//! failure out.
//!
//! The fetcher issues exactly one provider request per call, never retries,
//! and holds no state between calls. Moving averages are computed here from
//! the returned history rather than trusted from upstream.

use crate::data::{FetchError, QuoteProvider, QuoteRequest, RawBar};
use crate::domain::{DailyBar, QuoteRecord};
use crate::indicators::trailing_mean;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Short moving-average window.
pub const MA_SHORT: usize = 20;
/// Long moving-average window.
pub const MA_LONG: usize = 50;

/// Fewest trading days a request may ask for (enough for MA50).
pub const MIN_LOOKBACK_DAYS: u32 = MA_LONG as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-call deadline.
    pub timeout: Duration,
    /// Trading days of history to request; raised to `MIN_LOOKBACK_DAYS` if lower.
    pub lookback_days: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            lookback_days: 100,
        }
    }
}

#[derive(Clone)]
pub struct MarketDataFetcher {
    provider: Arc<dyn QuoteProvider>,
    settings: FetchSettings,
}

impl std::fmt::Debug for MarketDataFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataFetcher")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl MarketDataFetcher {
    pub fn new(provider: Arc<dyn QuoteProvider>, settings: FetchSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fetch and normalize one symbol.
    ///
    /// A response or error that arrives after the deadline is reported as a
    /// timeout even if the provider did not enforce the deadline itself.
    pub fn fetch(&self, symbol: &str) -> Result<QuoteRecord, FetchError> {
        if symbol.trim().is_empty() {
            return Err(FetchError::not_found(symbol));
        }

        let request = QuoteRequest {
            symbol,
            lookback_days: self.settings.lookback_days.max(MIN_LOOKBACK_DAYS),
            timeout: self.settings.timeout,
        };

        let started = Instant::now();
        let outcome = self.provider.quote_and_history(&request);
        // Past the deadline, any answer (success or error) is a timeout
        if started.elapsed() > self.settings.timeout {
            return Err(FetchError::timeout(self.settings.timeout));
        }
        let raw = outcome?;

        if !raw.price.is_finite() || raw.price <= 0.0 {
            return Err(FetchError::MalformedResponse(format!(
                "invalid price {} for {symbol}",
                raw.price
            )));
        }

        let history = normalize_history(raw.bars);
        if history.is_empty() {
            return Err(FetchError::MalformedResponse(format!(
                "no complete daily bars for {symbol}"
            )));
        }

        let closes: Vec<f64> = history.iter().map(|b| b.close).collect();
        let volume = raw
            .volume
            .or_else(|| history.last().map(|b| b.volume))
            .unwrap_or(0);

        Ok(QuoteRecord {
            symbol: symbol.to_string(),
            last_price: raw.price,
            volume,
            ma20: trailing_mean(&closes, MA_SHORT),
            ma50: trailing_mean(&closes, MA_LONG),
            history,
            fetched_at: Utc::now(),
        })
    }
}

/// Keep bars with finite OHLC, ascending by date, one per date (last wins).
fn normalize_history(raw: Vec<RawBar>) -> Vec<DailyBar> {
    let mut bars: Vec<DailyBar> = raw
        .into_iter()
        .filter_map(|b| {
            let bar = DailyBar {
                date: b.date,
                open: b.open?,
                high: b.high?,
                low: b.low?,
                close: b.close?,
                volume: b.volume.unwrap_or(0),
            };
            [bar.open, bar.high, bar.low, bar.close]
                .iter()
                .all(|v| v.is_finite())
                .then_some(bar)
        })
        .collect();

    bars.sort_by_key(|b| b.date);
    let mut deduped: Vec<DailyBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => deduped.push(bar),
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawQuote;
    use chrono::NaiveDate;

    struct FixedProvider(Result<RawQuote, FetchError>);

    impl QuoteProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn quote_and_history(&self, _request: &QuoteRequest<'_>) -> Result<RawQuote, FetchError> {
            self.0.clone()
        }
    }

    fn raw_bar(day: u32, close: f64) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day as i64),
            open: Some(close),
            high: Some(close + 1.0),
            low: Some(close - 1.0),
            close: Some(close),
            volume: Some(1_000),
        }
    }

    fn fetcher(result: Result<RawQuote, FetchError>) -> MarketDataFetcher {
        MarketDataFetcher::new(Arc::new(FixedProvider(result)), FetchSettings::default())
    }

    #[test]
    fn short_history_leaves_long_average_absent() {
        let bars: Vec<RawBar> = (0..30).map(|d| raw_bar(d, 100.0 + d as f64)).collect();
        let record = fetcher(Ok(RawQuote {
            symbol: "AAPL".into(),
            price: 130.0,
            volume: None,
            bars,
        }))
        .fetch("AAPL")
        .unwrap();

        assert_eq!(record.history.len(), 30);
        // mean(110..=129) = 119.5
        assert_eq!(record.ma20, Some(119.5));
        assert_eq!(record.ma50, None);
        // Volume falls back to the last bar
        assert_eq!(record.volume, 1_000);
    }

    #[test]
    fn unsorted_and_incomplete_bars_are_normalized() {
        let mut bars = vec![raw_bar(2, 3.0), raw_bar(0, 1.0), raw_bar(1, 2.0)];
        bars.push(RawBar {
            close: None,
            ..raw_bar(3, 4.0)
        });
        let record = fetcher(Ok(RawQuote {
            symbol: "X".into(),
            price: 3.0,
            volume: Some(7),
            bars,
        }))
        .fetch("X")
        .unwrap();

        let closes: Vec<f64> = record.history.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(record.volume, 7);
    }

    #[test]
    fn provider_errors_pass_through() {
        let err = fetcher(Err(FetchError::not_found("NOPE"))).fetch("NOPE").unwrap_err();
        assert_eq!(err, FetchError::not_found("NOPE"));
    }

    #[test]
    fn non_positive_price_is_malformed() {
        let err = fetcher(Ok(RawQuote {
            symbol: "X".into(),
            price: f64::NAN,
            volume: None,
            bars: vec![raw_bar(0, 1.0)],
        }))
        .fetch("X")
        .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn empty_symbol_is_not_found() {
        let err = fetcher(Err(FetchError::Transport("unused".into())))
            .fetch("  ")
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[test]
    fn duplicate_dates_keep_last() {
        let bars = normalize_history(vec![raw_bar(0, 1.0), raw_bar(0, 5.0)]);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 5.0);
    }
}
