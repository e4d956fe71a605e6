//! Sector: the closed set of industry classifications plus `Unknown`.
//!
//! Sector resolution is a total function: anything not in the sector table
//! resolves to [`Sector::Unknown`], so grouping over sectors is exhaustive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    #[serde(rename = "Basic Materials")]
    BasicMaterials,
    #[serde(rename = "Communication Services")]
    CommunicationServices,
    #[serde(rename = "Consumer Cyclical")]
    ConsumerCyclical,
    #[serde(rename = "Consumer Defensive")]
    ConsumerDefensive,
    #[serde(rename = "Energy")]
    Energy,
    #[serde(rename = "Financial Services")]
    FinancialServices,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Industrials")]
    Industrials,
    #[serde(rename = "Real Estate")]
    RealEstate,
    #[serde(rename = "Technology")]
    Technology,
    #[serde(rename = "Utilities")]
    Utilities,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Sector {
    /// The eleven named sectors, alphabetical. Excludes `Unknown`.
    pub const NAMED: [Sector; 11] = [
        Sector::BasicMaterials,
        Sector::CommunicationServices,
        Sector::ConsumerCyclical,
        Sector::ConsumerDefensive,
        Sector::Energy,
        Sector::FinancialServices,
        Sector::Healthcare,
        Sector::Industrials,
        Sector::RealEstate,
        Sector::Technology,
        Sector::Utilities,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Sector::BasicMaterials => "Basic Materials",
            Sector::CommunicationServices => "Communication Services",
            Sector::ConsumerCyclical => "Consumer Cyclical",
            Sector::ConsumerDefensive => "Consumer Defensive",
            Sector::Energy => "Energy",
            Sector::FinancialServices => "Financial Services",
            Sector::Healthcare => "Healthcare",
            Sector::Industrials => "Industrials",
            Sector::RealEstate => "Real Estate",
            Sector::Technology => "Technology",
            Sector::Utilities => "Utilities",
            Sector::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Sector::Unknown
    }

    /// Lenient name resolution used when reading sector databases:
    /// unrecognised names become `Unknown` instead of failing.
    pub fn from_name_lossy(name: &str) -> Sector {
        name.parse().unwrap_or(Sector::Unknown)
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sector '{0}'")]
pub struct ParseSectorError(pub String);

impl FromStr for Sector {
    type Err = ParseSectorError;

    /// Accepts display names and their snake/kebab spellings, case-insensitively
    /// ("Real Estate", "real_estate", "real-estate").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let sector = match key.as_str() {
            "basicmaterials" | "materials" => Sector::BasicMaterials,
            "communicationservices" | "communication" => Sector::CommunicationServices,
            "consumercyclical" => Sector::ConsumerCyclical,
            "consumerdefensive" => Sector::ConsumerDefensive,
            "energy" => Sector::Energy,
            "financialservices" | "financials" | "finance" => Sector::FinancialServices,
            "healthcare" => Sector::Healthcare,
            "industrials" => Sector::Industrials,
            "realestate" => Sector::RealEstate,
            "technology" | "tech" => Sector::Technology,
            "utilities" => Sector::Utilities,
            "unknown" => Sector::Unknown,
            _ => return Err(ParseSectorError(s.to_string())),
        };
        Ok(sector)
    }
}
