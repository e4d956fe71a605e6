//! Quote provider trait and the fetch failure taxonomy.
//!
//! `QuoteProvider` abstracts the upstream price/history source so the Yahoo
//! client can be swapped for the synthetic provider or a test double.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Raw daily bar as reported upstream. Any price may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Logical response: latest price and volume plus daily bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub symbol: String,
    pub price: f64,
    /// Latest session volume when the provider reports one separately.
    pub volume: Option<u64>,
    pub bars: Vec<RawBar>,
}

/// One logical request to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest<'a> {
    pub symbol: &'a str,
    /// Trading days of history wanted (at least 50).
    pub lookback_days: u32,
    /// Deadline for the whole request, including reading the body.
    pub timeout: Duration,
}

/// Closed set of per-symbol failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailureReason {
    NotFound,
    Timeout,
    Transport,
    MalformedResponse,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NotFound => "NotFound",
            FailureReason::Timeout => "Timeout",
            FailureReason::Transport => "Transport",
            FailureReason::MalformedResponse => "MalformedResponse",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A failed fetch, with detail. Every variant maps to one `FailureReason`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("symbol not found: {symbol}")]
    NotFound { symbol: String },

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn not_found(symbol: &str) -> Self {
        FetchError::NotFound {
            symbol: symbol.to_string(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        FetchError::Timeout {
            timeout_ms: after.as_millis() as u64,
        }
    }

    pub fn reason(&self) -> FailureReason {
        match self {
            FetchError::NotFound { .. } => FailureReason::NotFound,
            FetchError::Timeout { .. } => FailureReason::Timeout,
            FetchError::Transport(_) => FailureReason::Transport,
            FetchError::MalformedResponse(_) => FailureReason::MalformedResponse,
        }
    }

    /// Timeouts and transport errors may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.reason(), FailureReason::Timeout | FailureReason::Transport)
    }
}

/// Upstream quote/history source.
///
/// Implementations issue exactly one logical request per call, perform no
/// retries, honour `request.timeout`, and release any connection before
/// returning on both success and failure paths.
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn quote_and_history(&self, request: &QuoteRequest<'_>) -> Result<RawQuote, FetchError>;
}
