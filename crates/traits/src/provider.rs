//! Market data provider trait definitions.

use std::collections::BTreeSet;

use pcarisk_primitives::{CompanyRecord, Date, PriceBar, Ticker};

/// Errors raised by a market data provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not be reached or answered with an error status.
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider has no data for the ticker.
    #[error("no data available for {0}")]
    Unavailable(Ticker),

    /// The provider answered with a payload that could not be decoded.
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Returns whether a batch may skip the failing ticker and continue.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Decode(_))
    }
}

/// External source of daily bars and company metadata.
pub trait MarketDataProvider: Send + Sync {
    /// Download daily bars for every ticker between `start` and `end`.
    ///
    /// Tickers the provider knows nothing about are left out of the result.
    ///
    /// # Errors
    /// Returns `ProviderError` if nothing could be downloaded.
    fn download_bars(
        &self,
        tickers: &BTreeSet<Ticker>,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceBar>, ProviderError>;

    /// Reference metadata for one ticker; absent attributes are `None`.
    ///
    /// # Errors
    /// Returns `ProviderError` if the ticker is unknown or the request fails.
    fn company_info(&self, ticker: &Ticker) -> Result<CompanyRecord, ProviderError>;

    /// Tickers matching a free-text company name, best match first.
    ///
    /// # Errors
    /// Returns `ProviderError` if the search request fails.
    fn search_symbol(&self, query: &str) -> Result<Vec<Ticker>, ProviderError>;
}
