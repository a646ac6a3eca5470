//! Company reference data.

use serde::{Deserialize, Serialize};

use crate::Ticker;

/// Reference row describing a listed company.
///
/// Every attribute except the ticker may be unknown. Records without a sector
/// never take part in sector-attributed analyses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Instrument.
    pub ticker: Ticker,
    /// Short company name.
    pub name: Option<String>,
    /// Listing exchange.
    pub exchange: Option<String>,
    /// Industry classification.
    pub industry: Option<String>,
    /// Sector classification.
    pub sector: Option<String>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Book value per share.
    pub book_value: Option<f64>,
    /// Beta to the market.
    pub beta: Option<f64>,
    /// Index (universe) the record was resolved for.
    pub universe: Option<String>,
}

impl CompanyRecord {
    /// A record carrying nothing but its ticker.
    #[must_use]
    pub fn bare(ticker: Ticker) -> Self {
        Self { ticker, ..Self::default() }
    }

    /// Tag the record with the universe it belongs to.
    #[must_use]
    pub fn tagged(mut self, universe: impl Into<String>) -> Self {
        self.universe = Some(universe.into());
        self
    }

    /// Whether the record carries a sector classification.
    #[must_use]
    pub const fn has_sector(&self) -> bool {
        self.sector.is_some()
    }
}
