//! Market data store trait definitions.

use std::collections::BTreeSet;

use pcarisk_primitives::{BarRow, CompanyRecord, Date, PriceBar, PriceField, Ticker};

/// Errors raised by a market data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be opened or reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A query or insert failed.
    #[error("store query failed: {0}")]
    Query(String),

    /// A persisted value could not be decoded.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

/// Relational store of price bars and company records.
///
/// Inserts are idempotent under their natural key (ticker and date for bars,
/// ticker and universe tag for companies). On conflict the first insert stands
/// and the new row is silently ignored.
pub trait MarketStore: Send + Sync {
    /// Insert a bar. Returns `true` when the row was new.
    ///
    /// # Errors
    /// Returns `StoreError` if the store is unreachable.
    fn insert_bar(&self, bar: &PriceBar) -> Result<bool, StoreError>;

    /// Insert many bars. Returns the number of new rows.
    ///
    /// # Errors
    /// Returns `StoreError` if the store is unreachable.
    fn insert_bars(&self, bars: &[PriceBar]) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for bar in bars {
            inserted += usize::from(self.insert_bar(bar)?);
        }
        Ok(inserted)
    }

    /// Insert a company record. Returns `true` when the row was new.
    ///
    /// # Errors
    /// Returns `StoreError` if the store is unreachable.
    fn insert_company(&self, record: &CompanyRecord) -> Result<bool, StoreError>;

    /// Insert a company record, replacing any record with the same ticker and
    /// universe tag.
    ///
    /// # Errors
    /// Returns `StoreError` if the store is unreachable.
    fn upsert_company(&self, record: &CompanyRecord) -> Result<(), StoreError>;

    /// Delete the records tagged with `universe` whose ticker is not in
    /// `tickers`. Returns the number of records removed.
    ///
    /// # Errors
    /// Returns `StoreError` if the store is unreachable.
    fn retain_universe(
        &self,
        universe: &str,
        tickers: &BTreeSet<Ticker>,
    ) -> Result<usize, StoreError>;

    /// Bars with `start <= date <= end` and ticker in `tickers`, projected onto
    /// `fields`, ordered by date then ticker.
    ///
    /// # Errors
    /// Returns `StoreError` if the query fails.
    fn query_bars(
        &self,
        tickers: &BTreeSet<Ticker>,
        start: Date,
        end: Date,
        fields: &[PriceField],
    ) -> Result<Vec<BarRow>, StoreError>;

    /// Company records for `tickers`, optionally only those with a sector.
    ///
    /// # Errors
    /// Returns `StoreError` if the query fails.
    fn query_companies(
        &self,
        tickers: &BTreeSet<Ticker>,
        require_sector: bool,
    ) -> Result<Vec<CompanyRecord>, StoreError>;

    /// Distinct tickers of the company records tagged with `universe`.
    ///
    /// # Errors
    /// Returns `StoreError` if the query fails.
    fn query_distinct_tickers(&self, universe: &str) -> Result<BTreeSet<Ticker>, StoreError>;

    /// Most recent bar date in the store, if any bar exists.
    ///
    /// # Errors
    /// Returns `StoreError` if the query fails.
    fn latest_bar_date(&self) -> Result<Option<Date>, StoreError>;

    /// Most recent bar date of `ticker`, if it has any bar.
    ///
    /// # Errors
    /// Returns `StoreError` if the query fails.
    fn latest_bar_date_for(&self, ticker: &Ticker) -> Result<Option<Date>, StoreError>;
}
