//! In-memory market store.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{PoisonError, RwLock},
};

use pcarisk_primitives::{BarRow, CompanyRecord, Date, PriceBar, PriceField, Ticker};
use pcarisk_traits::{MarketStore, StoreError};

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

/// Market store held in ordered maps.
///
/// Bars are keyed by (date, ticker), companies by (ticker, universe tag).
#[derive(Debug, Default)]
pub struct MemoryStore {
    bars: RwLock<BTreeMap<(Date, Ticker), PriceBar>>,
    companies: RwLock<BTreeMap<(Ticker, String), CompanyRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self { bars: RwLock::new(BTreeMap::new()), companies: RwLock::new(BTreeMap::new()) }
    }

    /// Number of stored bars.
    ///
    /// # Errors
    /// Returns `StoreError` if the lock is poisoned.
    pub fn bar_count(&self) -> Result<usize, StoreError> {
        Ok(self.bars.read().map_err(poisoned)?.len())
    }

    /// Number of stored company records.
    ///
    /// # Errors
    /// Returns `StoreError` if the lock is poisoned.
    pub fn company_count(&self) -> Result<usize, StoreError> {
        Ok(self.companies.read().map_err(poisoned)?.len())
    }
}

impl MarketStore for MemoryStore {
    fn insert_bar(&self, bar: &PriceBar) -> Result<bool, StoreError> {
        let mut bars = self.bars.write().map_err(poisoned)?;
        let key = (bar.date, bar.ticker.clone());
        if bars.contains_key(&key) {
            return Ok(false);
        }
        bars.insert(key, bar.clone());
        Ok(true)
    }

    fn insert_company(&self, record: &CompanyRecord) -> Result<bool, StoreError> {
        let mut companies = self.companies.write().map_err(poisoned)?;
        let key = (record.ticker.clone(), record.universe.clone().unwrap_or_default());
        if companies.contains_key(&key) {
            return Ok(false);
        }
        companies.insert(key, record.clone());
        Ok(true)
    }

    fn upsert_company(&self, record: &CompanyRecord) -> Result<(), StoreError> {
        let mut companies = self.companies.write().map_err(poisoned)?;
        let key = (record.ticker.clone(), record.universe.clone().unwrap_or_default());
        companies.insert(key, record.clone());
        Ok(())
    }

    fn retain_universe(
        &self,
        universe: &str,
        tickers: &BTreeSet<Ticker>,
    ) -> Result<usize, StoreError> {
        let mut companies = self.companies.write().map_err(poisoned)?;
        let before = companies.len();
        companies.retain(|(ticker, tag), _| tag != universe || tickers.contains(ticker));
        Ok(before - companies.len())
    }

    fn query_bars(
        &self,
        tickers: &BTreeSet<Ticker>,
        start: Date,
        end: Date,
        fields: &[PriceField],
    ) -> Result<Vec<BarRow>, StoreError> {
        let bars = self.bars.read().map_err(poisoned)?;
        Ok(bars
            .range((start, Ticker::default())..)
            .take_while(|((date, _), _)| *date <= end)
            .filter(|((_, ticker), _)| tickers.contains(ticker))
            .map(|(_, bar)| bar.project(fields))
            .collect())
    }

    fn query_companies(
        &self,
        tickers: &BTreeSet<Ticker>,
        require_sector: bool,
    ) -> Result<Vec<CompanyRecord>, StoreError> {
        let companies = self.companies.read().map_err(poisoned)?;
        Ok(companies
            .values()
            .filter(|c| tickers.contains(&c.ticker))
            .filter(|c| !require_sector || c.has_sector())
            .cloned()
            .collect())
    }

    fn query_distinct_tickers(&self, universe: &str) -> Result<BTreeSet<Ticker>, StoreError> {
        let companies = self.companies.read().map_err(poisoned)?;
        Ok(companies
            .keys()
            .filter(|(_, tag)| tag == universe)
            .map(|(ticker, _)| ticker.clone())
            .collect())
    }

    fn latest_bar_date(&self) -> Result<Option<Date>, StoreError> {
        let bars = self.bars.read().map_err(poisoned)?;
        Ok(bars.keys().next_back().map(|(date, _)| *date))
    }

    fn latest_bar_date_for(&self, ticker: &Ticker) -> Result<Option<Date>, StoreError> {
        let bars = self.bars.read().map_err(poisoned)?;
        Ok(bars.keys().rev().find(|(_, t)| t == ticker).map(|(date, _)| *date))
    }
}
