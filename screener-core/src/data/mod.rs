//! Quote providers: the upstream market-data boundary.

pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use provider::{FailureReason, FetchError, QuoteProvider, QuoteRequest, RawBar, RawQuote};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
