//! Batch loader: fetch a bounded, ordered batch of symbols with per-symbol
//! failure isolation and deterministic accounting.
//!
//! The default is strictly sequential: one request in flight, a short pause
//! between requests. With `concurrency > 1` fetches run on a private rayon
//! pool (never the global one) of that many threads.
//!
//! Every requested symbol ends in exactly one of `records` or `failures`,
//! so `loaded_count + skipped_count == requested_symbols.len()` always holds.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use screener_core::{FailureReason, FetchError, MarketDataFetcher, QuoteRecord};

use crate::progress::LoadProgress;

/// Largest batch a configuration may ask for. `BatchLoader` itself honours
/// any positive bound.
pub const MAX_BATCH: usize = 500;

/// Most fetches the concurrent variant keeps in flight.
pub const MAX_CONCURRENCY: usize = 10;

/// Upper bound on a single backoff pause.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

// ── Options ──────────────────────────────────────────────────────────

/// Bounded retry for transient failures (Timeout, Transport).
///
/// NotFound and MalformedResponse are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each later one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Exactly one attempt per symbol.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Pause before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// 1 = sequential. Clamped to `1..=MAX_CONCURRENCY`.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Pause between consecutive sequential requests.
    pub request_interval: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            retry: RetryPolicy::none(),
            request_interval: Duration::from_millis(100),
        }
    }
}

// ── Cancellation ─────────────────────────────────────────────────────

/// Cooperative cancellation flag shared between the caller and a running load.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A load was abandoned before every symbol finished. Nothing fetched by the
/// abandoned load is exposed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("batch load cancelled after {completed} of {total} symbols")]
pub struct LoadCancelled {
    pub completed: usize,
    pub total: usize,
}

// ── Result ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: FailureReason,
    pub detail: String,
}

/// Outcome of one load. Records and failures are both kept in requested
/// order, so the result does not depend on the order fetches completed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    requested_symbols: Vec<String>,
    records: Vec<QuoteRecord>,
    failures: Vec<SymbolFailure>,
    available_count: usize,
    max_batch: usize,
}

impl BatchResult {
    fn assemble(
        requested: Vec<String>,
        outcomes: Vec<Result<QuoteRecord, FetchError>>,
        available_count: usize,
        max_batch: usize,
    ) -> Self {
        let mut records = Vec::new();
        let mut failures = Vec::new();
        for (symbol, outcome) in requested.iter().zip(outcomes) {
            match outcome {
                Ok(record) => records.push(record),
                Err(e) => failures.push(SymbolFailure {
                    symbol: symbol.clone(),
                    reason: e.reason(),
                    detail: e.to_string(),
                }),
            }
        }
        Self {
            requested_symbols: requested,
            records,
            failures,
            available_count,
            max_batch,
        }
    }

    /// The truncated batch, in input order.
    pub fn requested_symbols(&self) -> &[String] {
        &self.requested_symbols
    }

    pub fn records(&self) -> &[QuoteRecord] {
        &self.records
    }

    pub fn failures(&self) -> &[SymbolFailure] {
        &self.failures
    }

    pub fn record(&self, symbol: &str) -> Option<&QuoteRecord> {
        self.records.iter().find(|r| r.symbol == symbol)
    }

    pub fn failure(&self, symbol: &str) -> Option<FailureReason> {
        self.failures
            .iter()
            .find(|f| f.symbol == symbol)
            .map(|f| f.reason)
    }

    pub fn loaded_count(&self) -> usize {
        self.records.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.failures.len()
    }

    /// Distinct symbols offered before truncation.
    pub fn available_count(&self) -> usize {
        self.available_count
    }

    /// Symbols left out because the batch bound was reached.
    pub fn truncated_count(&self) -> usize {
        self.available_count - self.requested_symbols.len()
    }

    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// "N of M symbols loaded", noting any truncation.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} of {} symbols loaded",
            self.loaded_count(),
            self.requested_symbols.len()
        );
        if self.truncated_count() > 0 {
            line.push_str(&format!(
                " ({} more matched; batch limit is {})",
                self.truncated_count(),
                self.max_batch
            ));
        }
        line
    }

    /// BLAKE3 over everything except fetch timestamps.
    ///
    /// Two loads of the same inputs against a deterministic provider hash
    /// equal regardless of concurrency.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for symbol in &self.requested_symbols {
            hasher.update(symbol.as_bytes());
            hasher.update(b"\n");
        }
        for record in &self.records {
            hasher.update(record.symbol.as_bytes());
            hasher.update(&record.last_price.to_le_bytes());
            hasher.update(&record.volume.to_le_bytes());
            for ma in [record.ma20, record.ma50] {
                match ma {
                    Some(v) => hasher.update(&v.to_le_bytes()),
                    None => hasher.update(b"-"),
                };
            }
            for bar in &record.history {
                hasher.update(bar.date.to_string().as_bytes());
                hasher.update(&bar.open.to_le_bytes());
                hasher.update(&bar.high.to_le_bytes());
                hasher.update(&bar.low.to_le_bytes());
                hasher.update(&bar.close.to_le_bytes());
                hasher.update(&bar.volume.to_le_bytes());
            }
        }
        for failure in &self.failures {
            hasher.update(failure.symbol.as_bytes());
            hasher.update(failure.reason.as_str().as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

// ── Loader ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BatchLoader {
    fetcher: MarketDataFetcher,
    options: LoadOptions,
}

impl BatchLoader {
    pub fn new(fetcher: MarketDataFetcher, options: LoadOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load up to `max_batch` symbols. Never fails: an all-failure batch is a
    /// valid result.
    pub fn load(
        &self,
        symbols: &[String],
        max_batch: NonZeroUsize,
        progress: &dyn LoadProgress,
    ) -> BatchResult {
        match self.load_cancellable(symbols, max_batch, progress, &CancelToken::new()) {
            Ok(result) => result,
            Err(cancelled) => unreachable!("fresh cancel token fired: {cancelled}"),
        }
    }

    /// Like `load`, but abandons the batch once `cancel` fires. Fetches
    /// already in flight run to completion and are discarded.
    pub fn load_cancellable(
        &self,
        symbols: &[String],
        max_batch: NonZeroUsize,
        progress: &dyn LoadProgress,
        cancel: &CancelToken,
    ) -> Result<BatchResult, LoadCancelled> {
        let max_batch = max_batch.get();
        let distinct = dedupe(symbols);
        let available_count = distinct.len();
        let requested: Vec<String> = distinct.into_iter().take(max_batch).collect();

        if available_count > requested.len() {
            log::info!(
                "batch truncated to {} of {available_count} symbols",
                requested.len()
            );
        }

        let concurrency = self.options.concurrency.clamp(1, MAX_CONCURRENCY);
        let outcomes = if concurrency > 1 && requested.len() > 1 {
            self.run_pooled(&requested, concurrency, progress, cancel)?
        } else {
            self.run_sequential(&requested, progress, cancel)?
        };

        let result = BatchResult::assemble(requested, outcomes, available_count, max_batch);
        log::info!("{}", result.summary_line());
        progress.on_batch_complete(result.loaded_count(), result.requested_symbols.len());
        Ok(result)
    }

    fn run_sequential(
        &self,
        batch: &[String],
        progress: &dyn LoadProgress,
        cancel: &CancelToken,
    ) -> Result<Vec<Result<QuoteRecord, FetchError>>, LoadCancelled> {
        let total = batch.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, symbol) in batch.iter().enumerate() {
            if i > 0 && !self.options.request_interval.is_zero() {
                std::thread::sleep(self.options.request_interval);
            }
            if cancel.is_cancelled() {
                return Err(LoadCancelled {
                    completed: i,
                    total,
                });
            }
            let outcome = self.fetch_with_retry(symbol, cancel);
            progress.on_symbol(symbol, outcome.as_ref().map(|_| ()));
            progress.on_progress(i + 1, total);
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    fn run_pooled(
        &self,
        batch: &[String],
        threads: usize,
        progress: &dyn LoadProgress,
        cancel: &CancelToken,
    ) -> Result<Vec<Result<QuoteRecord, FetchError>>, LoadCancelled> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("screener-fetch-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("could not start fetch pool ({e}); loading sequentially");
                return self.run_sequential(batch, progress, cancel);
            }
        };

        let total = batch.len();
        // Held while notifying so progress counts reach the sink in order.
        let completed = Mutex::new(0usize);

        let outcomes: Vec<Option<Result<QuoteRecord, FetchError>>> = pool.install(|| {
            batch
                .par_iter()
                .with_max_len(1)
                .map(|symbol| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let outcome = self.fetch_with_retry(symbol, cancel);
                    let mut done = completed.lock().unwrap_or_else(PoisonError::into_inner);
                    *done += 1;
                    progress.on_symbol(symbol, outcome.as_ref().map(|_| ()));
                    progress.on_progress(*done, total);
                    Some(outcome)
                })
                .collect()
        });

        let completed = completed.into_inner().unwrap_or_else(PoisonError::into_inner);
        outcomes
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(LoadCancelled { completed, total })
    }

    /// One terminal outcome per symbol; retries only transient failures.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        cancel: &CancelToken,
    ) -> Result<QuoteRecord, FetchError> {
        let policy = self.options.retry;
        let mut retry = 0;
        loop {
            log::debug!("fetching {symbol} (attempt {})", retry + 1);
            match self.fetcher.fetch(symbol) {
                Ok(record) => return Ok(record),
                Err(e) if e.is_retryable() && retry < policy.max_retries && !cancel.is_cancelled() => {
                    let delay = policy.delay_for(retry);
                    log::debug!("{symbol}: {e}; retrying in {delay:?}");
                    std::thread::sleep(delay);
                    retry += 1;
                }
                Err(e) => {
                    log::warn!("skipping {symbol}: {} ({e})", e.reason());
                    return Err(e);
                }
            }
        }
    }
}

/// Drop repeated symbols, keeping the first occurrence.
fn dedupe(symbols: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(symbols.len());
    symbols
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .cloned()
        .collect()
}
