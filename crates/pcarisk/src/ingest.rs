//! Filling the store from the market data provider.

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::AddAssign,
};

use pcarisk_primitives::{Date, Ticker};
use pcarisk_traits::{ListingSource, MarketDataProvider, MarketStore};
use tracing::info;

use crate::{Pipeline, PipelineError};

/// Counts from one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Tickers requested.
    pub tickers: usize,
    /// Rows received from the provider. For company metadata, the tickers
    /// described by the provider or retried.
    pub received: usize,
    /// Rows new to the store, or company records written.
    pub inserted: usize,
}

impl AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.tickers += other.tickers;
        self.received += other.received;
        self.inserted += other.inserted;
    }
}

impl IngestReport {
    /// Rows already present in the store.
    #[must_use]
    pub const fn ignored(&self) -> usize {
        self.received.saturating_sub(self.inserted)
    }
}

impl<S, L, P> Pipeline<S, L, P>
where
    S: MarketStore,
    L: ListingSource,
    P: MarketDataProvider,
{
    /// Download bars for the universe of `index_name` from `start` (or the
    /// configured first date) to today and store them.
    ///
    /// # Errors
    /// Returns a resolution error, `Provider` if no ticker could be
    /// downloaded, or `StoreUnavailable`.
    pub fn populate_prices(
        &self,
        index_name: &str,
        start: Option<Date>,
    ) -> Result<IngestReport, PipelineError> {
        let tickers = self.universe(index_name)?;
        let start = start.unwrap_or(self.config().first_date);
        self.ingest_bars(&tickers, start, self.today())
    }

    /// Fetch and store company metadata for the universe of `index_name`.
    ///
    /// On a cold store the universe is scraped and every ticker is described
    /// once, with a bare record where the provider has no metadata. On a warm
    /// store only tickers whose record lacks a sector are requested again, and
    /// the records of those the provider now describes are replaced.
    ///
    /// # Errors
    /// Returns a resolution error or `StoreUnavailable`.
    pub fn populate_companies(&self, index_name: &str) -> Result<IngestReport, PipelineError> {
        let resolver = self.resolver();
        let spec = resolver.catalog().lookup(index_name)?;
        let report = match resolver.try_store(&spec)? {
            Some(tickers) => {
                let missing = resolver.missing_metadata(spec.name(), &tickers)?;
                let inserted = resolver.backfill_companies(spec.name(), &missing)?;
                IngestReport { tickers: tickers.len(), received: missing.len(), inserted }
            }
            None => {
                let tickers = resolver.compute(&spec)?;
                let inserted = resolver.persist(&spec, &tickers)?;
                IngestReport { tickers: tickers.len(), received: tickers.len(), inserted }
            }
        };
        info!(index = spec.name(), ?report, "populated companies");
        Ok(report)
    }

    /// Download each ticker's bars after its latest stored date up to today.
    ///
    /// Tickers with no stored bar, such as constituents added by a refresh,
    /// start at the configured first date. Tickers sharing a start date are
    /// downloaded together. Returns a report with no rows when every ticker is
    /// already current.
    ///
    /// # Errors
    /// Same as [`populate_prices`](Self::populate_prices).
    pub fn update_prices(&self, index_name: &str) -> Result<IngestReport, PipelineError> {
        let tickers = self.universe(index_name)?;
        let end = self.today();

        let mut batches: BTreeMap<Date, BTreeSet<Ticker>> = BTreeMap::new();
        for ticker in &tickers {
            let start = match self.store().latest_bar_date_for(ticker)? {
                Some(latest) => latest.succ_opt().unwrap_or(latest),
                None => self.config().first_date,
            };
            if start <= end {
                batches.entry(start).or_default().insert(ticker.clone());
            }
        }

        let mut report = IngestReport::default();
        for (start, batch) in &batches {
            report += self.ingest_bars(batch, *start, end)?;
        }
        report.tickers = tickers.len();
        if batches.is_empty() {
            info!(index = index_name, %end, "prices already current");
        }
        Ok(report)
    }

    fn ingest_bars(
        &self,
        tickers: &BTreeSet<Ticker>,
        start: Date,
        end: Date,
    ) -> Result<IngestReport, PipelineError> {
        let bars = self.provider().download_bars(tickers, start, end)?;
        let inserted = self.store().insert_bars(&bars)?;
        let report = IngestReport { tickers: tickers.len(), received: bars.len(), inserted };
        info!(%start, %end, ?report, ignored = report.ignored(), "ingested bars");
        Ok(report)
    }
}
