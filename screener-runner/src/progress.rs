//! Progress sinks for batch loads.
//!
//! `on_progress` is the contract every sink must honour: it is called exactly
//! once per requested symbol with a strictly increasing `completed` count that
//! ends at `total`. The per-symbol and batch-complete hooks are optional.

use std::io::Write;

use screener_core::FetchError;

/// Receives progress updates from `BatchLoader`.
///
/// Sinks must be `Sync`: the bounded-concurrency loader calls them from pool
/// threads, though never from two threads at once.
pub trait LoadProgress: Sync {
    /// One more symbol reached its terminal outcome.
    fn on_progress(&self, completed: usize, total: usize);

    /// Called just before `on_progress` with the symbol that finished.
    fn on_symbol(&self, _symbol: &str, _outcome: Result<(), &FetchError>) {}

    /// Called once after the last symbol, not called on cancellation.
    fn on_batch_complete(&self, _loaded: usize, _requested: usize) {}
}

impl<F> LoadProgress for F
where
    F: Fn(usize, usize) + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl LoadProgress for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Writes `SYMBOL ok [i/N]` lines to stderr, keeping stdout free for reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl LoadProgress for ConsoleProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        eprintln!(" [{completed}/{total}]");
    }

    fn on_symbol(&self, symbol: &str, outcome: Result<(), &FetchError>) {
        let mut err = std::io::stderr().lock();
        let _ = match outcome {
            Ok(()) => write!(err, "  {symbol:<8} ok"),
            Err(e) => write!(err, "  {symbol:<8} skipped ({})", e.reason()),
        };
    }

    fn on_batch_complete(&self, loaded: usize, requested: usize) {
        eprintln!("{loaded} of {requested} symbols loaded");
    }
}
