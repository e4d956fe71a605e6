//! Synthetic quote provider for offline demos and tests.
//!
//! Produces a deterministic random walk per symbol, seeded from a BLAKE3
//! hash of the symbol name. These prices are clearly fake.

use super::provider::{FetchError, QuoteProvider, QuoteRequest, RawBar, RawQuote};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Longest symbol the synthetic provider will answer for.
const MAX_SYMBOL_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    end: NaiveDate,
}

impl SyntheticProvider {
    /// Bars end on `end` (inclusive), so output does not depend on the clock.
    pub fn new(end: NaiveDate) -> Self {
        Self { end }
    }

    /// Symbols outside `[A-Z0-9.-]{1,10}` have "no data", which keeps the
    /// not-found path reachable offline.
    fn is_plausible(symbol: &str) -> bool {
        !symbol.is_empty()
            && symbol.len() <= MAX_SYMBOL_LEN
            && symbol
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-')
    }

    fn generate_bars(&self, symbol: &str, lookback_days: u32) -> Vec<RawBar> {
        // Deterministic seed from symbol name
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut dates = Vec::with_capacity(lookback_days as usize);
        let mut current = self.end;
        while dates.len() < lookback_days as usize {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                dates.push(current);
            }
            match current.pred_opt() {
                Some(prev) => current = prev,
                None => break,
            }
        }
        dates.reverse();

        let mut price = rng.gen_range(10.0..500.0_f64);
        dates
            .into_iter()
            .map(|date| {
                let daily_return: f64 = rng.gen_range(-0.03..0.03);
                let open = price;
                let close = price * (1.0 + daily_return);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
                let volume = rng.gen_range(500_000..5_000_000u64);
                price = close;
                RawBar {
                    date,
                    open: Some(open),
                    high: Some(high),
                    low: Some(low),
                    close: Some(close),
                    volume: Some(volume),
                }
            })
            .collect()
    }
}

impl QuoteProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn quote_and_history(&self, request: &QuoteRequest<'_>) -> Result<RawQuote, FetchError> {
        if !Self::is_plausible(request.symbol) {
            return Err(FetchError::not_found(request.symbol));
        }
        let bars = self.generate_bars(request.symbol, request.lookback_days);
        let last = bars
            .last()
            .ok_or_else(|| FetchError::not_found(request.symbol))?;
        Ok(RawQuote {
            symbol: request.symbol.to_string(),
            price: last.close.unwrap_or_default(),
            volume: last.volume,
            bars,
        })
    }
}
