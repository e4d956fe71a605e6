//! Screener Runner: batch loading, configuration, reporting.
//!
//! This crate builds on `screener-core` to provide:
//! - `BatchLoader`: bounded, partial-failure tolerant batch fetch
//!   (sequential by default, optional bounded pool, cancellation, retry)
//! - Progress sinks
//! - TOML configuration
//! - Summary rows, sector breakdown, candle series
//! - CSV and JSON export

pub mod batch;
pub mod config;
pub mod progress;
pub mod reporting;

pub use batch::{
    BatchLoader, BatchResult, CancelToken, LoadCancelled, LoadOptions, RetryPolicy,
    SymbolFailure, MAX_BATCH, MAX_CONCURRENCY,
};
pub use config::{ConfigError, ProviderKind, ScreenerConfig};
pub use progress::{ConsoleProgress, LoadProgress, NoProgress};
pub use reporting::{
    candle_series, export_history_csv, export_json, export_summary_csv, sector_breakdown,
    summary_rows, write_artifact, CandlePoint, SectorSlice, SummaryRow,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<BatchLoader>();
        assert_sync::<BatchLoader>();
        assert_send::<BatchResult>();
        assert_sync::<BatchResult>();
        assert_send::<CancelToken>();
        assert_sync::<CancelToken>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<ScreenerConfig>();
        assert_sync::<ScreenerConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn progress_sinks_are_sync() {
        assert_sync::<ConsoleProgress>();
        assert_sync::<NoProgress>();
    }
}
