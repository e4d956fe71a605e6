//! Domain types: tickers, sectors, daily bars, quotes.

pub mod quote;
pub mod sector;
pub mod ticker;

pub use quote::{DailyBar, QuoteRecord};
pub use sector::{ParseSectorError, Sector};
pub use ticker::{Exchange, ParseExchangeError, TickerRecord};
