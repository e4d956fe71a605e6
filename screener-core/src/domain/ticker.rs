//! TickerRecord: one listed equity in the universe.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Listing venue. Every non-NASDAQ listing is reported as NYSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Nasdaq,
    Nyse,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Nasdaq, Exchange::Nyse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Nasdaq => "NASDAQ",
            Exchange::Nyse => "NYSE",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown exchange '{0}' (expected NASDAQ or NYSE)")]
pub struct ParseExchangeError(pub String);

impl FromStr for Exchange {
    type Err = ParseExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NASDAQ" => Ok(Exchange::Nasdaq),
            "NYSE" => Ok(Exchange::Nyse),
            _ => Err(ParseExchangeError(s.to_string())),
        }
    }
}

/// A single entry of the ticker universe. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerRecord {
    /// Upper-case, non-empty, unique within a catalog.
    pub symbol: String,
    pub exchange: Exchange,
    /// Security name from the symbol directory (may be empty).
    pub name: String,
}

impl TickerRecord {
    pub fn new(symbol: &str, exchange: Exchange, name: &str) -> Self {
        Self {
            symbol: symbol.trim().to_ascii_uppercase(),
            exchange,
            name: name.trim().to_string(),
        }
    }

    /// First character of the symbol, upper-cased.
    pub fn initial(&self) -> Option<char> {
        self.symbol.chars().next().map(|c| c.to_ascii_uppercase())
    }
}
