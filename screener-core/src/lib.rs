//! Screener Core: domain types, ticker catalog, quote providers, fetcher.
//!
//! This crate contains the leaf components of the screener:
//! - Domain types (tickers, exchanges, sectors, daily bars, quotes)
//! - Read-only ticker catalog with exchange / letter / sector filtering
//! - Static sector database with total lookup
//! - `QuoteProvider` trait with Yahoo Finance and synthetic implementations
//! - Moving-average indicators
//! - `MarketDataFetcher`: one symbol → one `QuoteRecord` or typed failure

pub mod catalog;
pub mod data;
pub mod domain;
pub mod fetcher;
pub mod indicators;

pub use catalog::{CatalogError, SectorTable, TickerCatalog, TickerFilter, UniverseSource};
pub use data::{FailureReason, FetchError, QuoteProvider, QuoteRequest, RawBar, RawQuote};
pub use domain::{DailyBar, Exchange, QuoteRecord, Sector, TickerRecord};
pub use fetcher::{FetchSettings, MarketDataFetcher, MA_LONG, MA_SHORT};
