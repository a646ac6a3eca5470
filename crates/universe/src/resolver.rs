//! Read-through universe resolution.

use std::{collections::BTreeSet, thread, time::Duration};

use pcarisk_primitives::{CompanyRecord, Ticker};
use pcarisk_traits::{ListingSource, MarketDataProvider, MarketStore, ProviderError};
use tracing::{debug, info, warn};

use crate::{ColumnKind, IndexCatalog, IndexSpec, UniverseError, strip_corporate_suffix};

/// Resolves index names to ticker sets, caching them in a store.
///
/// The store keeps one company record per ticker tagged with the canonical
/// index name. [`resolve`](Self::resolve) reads that cache first;
/// [`refresh`](Self::refresh) always scrapes the listing pages.
#[derive(Debug)]
pub struct UniverseResolver<'a, S: ?Sized, L: ?Sized, P: ?Sized> {
    store: &'a S,
    listing: &'a L,
    provider: &'a P,
    catalog: IndexCatalog,
    metadata_pause: Duration,
}

impl<'a, S, L, P> UniverseResolver<'a, S, L, P>
where
    S: MarketStore + ?Sized,
    L: ListingSource + ?Sized,
    P: MarketDataProvider + ?Sized,
{
    /// Create a resolver over the default catalog with no pause between metadata requests.
    pub fn new(store: &'a S, listing: &'a L, provider: &'a P) -> Self {
        Self {
            store,
            listing,
            provider,
            catalog: IndexCatalog::default(),
            metadata_pause: Duration::ZERO,
        }
    }

    /// Use another catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: IndexCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Wait `pause` between consecutive metadata requests.
    #[must_use]
    pub const fn with_metadata_pause(mut self, pause: Duration) -> Self {
        self.metadata_pause = pause;
        self
    }

    /// The catalog used to look up index names.
    pub const fn catalog(&self) -> &IndexCatalog {
        &self.catalog
    }

    /// Tickers of `index_name`, from the store when cached, scraped otherwise.
    ///
    /// # Errors
    /// Returns `InvalidUniverse` for an unknown name, `ResolutionFailure` if the
    /// listing cannot be scraped, or a store error.
    pub fn resolve(&self, index_name: &str) -> Result<BTreeSet<Ticker>, UniverseError> {
        let spec = self.catalog.lookup(index_name)?;
        match self.try_store(&spec)? {
            Some(tickers) => Ok(tickers),
            None => self.compute_and_persist(&spec),
        }
    }

    /// Scrape `index_name` again and make the result the cached universe.
    ///
    /// New constituents are persisted and tickers that left the listing lose
    /// the index tag, so a later [`resolve`](Self::resolve) returns the same set.
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve).
    pub fn refresh(&self, index_name: &str) -> Result<BTreeSet<Ticker>, UniverseError> {
        let spec = self.catalog.lookup(index_name)?;
        self.compute_and_persist(&spec)
    }

    /// Tickers stored under the index tag, or `None` when nothing is cached.
    ///
    /// # Errors
    /// Returns a store error if the query fails.
    pub fn try_store(&self, spec: &IndexSpec) -> Result<Option<BTreeSet<Ticker>>, UniverseError> {
        let tickers = self.store.query_distinct_tickers(spec.name())?;
        if tickers.is_empty() {
            debug!(index = spec.name(), "universe not cached");
            return Ok(None);
        }
        debug!(index = spec.name(), tickers = tickers.len(), "universe cache hit");
        Ok(Some(tickers))
    }

    /// Scrape the listing pages and persist the result.
    ///
    /// # Errors
    /// Returns `ResolutionFailure` if a page fails or the scrape is empty, or a
    /// store error.
    pub fn compute_and_persist(&self, spec: &IndexSpec) -> Result<BTreeSet<Ticker>, UniverseError> {
        let tickers = self.compute(spec)?;
        self.persist(spec, &tickers)?;
        Ok(tickers)
    }

    /// Make `tickers` the stored universe of `spec`.
    ///
    /// Only tickers without a record under the index tag are described by the
    /// provider. Records of tickers outside `tickers` are deleted. Returns the
    /// number of new records.
    ///
    /// # Errors
    /// Returns a store error if a write fails.
    pub fn persist(
        &self,
        spec: &IndexSpec,
        tickers: &BTreeSet<Ticker>,
    ) -> Result<usize, UniverseError> {
        let stored = self.store.query_distinct_tickers(spec.name())?;
        let joined: BTreeSet<Ticker> = tickers.difference(&stored).cloned().collect();
        let inserted = self.persist_companies(spec.name(), &joined)?;
        let removed = self.store.retain_universe(spec.name(), tickers)?;
        info!(index = spec.name(), tickers = tickers.len(), inserted, removed, "resolved universe");
        Ok(inserted)
    }

    /// Scrape the listing pages without touching the store.
    ///
    /// # Errors
    /// Returns `ResolutionFailure` if a page fails or the scrape is empty.
    pub fn compute(&self, spec: &IndexSpec) -> Result<BTreeSet<Ticker>, UniverseError> {
        let mut tickers = BTreeSet::new();
        for (url, page) in spec.pages() {
            let cells = self
                .listing
                .table_column(url, page.table_id, page.column)
                .map_err(|e| UniverseError::failure(spec.name(), e))?;
            debug!(url = url.as_str(), cells = cells.len(), "read listing");

            match page.kind {
                ColumnKind::Symbol { suffix } => {
                    tickers.extend(cells.iter().filter_map(|raw| Ticker::canonical(raw, suffix)));
                }
                ColumnKind::CompanyName => {
                    for name in &cells {
                        if let Some(ticker) = self.search_ticker(spec, name)? {
                            tickers.insert(ticker);
                        }
                    }
                }
            }
        }

        if tickers.is_empty() {
            return Err(UniverseError::failure(spec.name(), "listing yielded no tickers"));
        }
        Ok(tickers)
    }

    fn search_ticker(&self, spec: &IndexSpec, name: &str) -> Result<Option<Ticker>, UniverseError> {
        let query = strip_corporate_suffix(name);
        let hits = match self.provider.search_symbol(&query) {
            Ok(hits) => hits,
            Err(err) if err.is_recoverable() => {
                warn!(name, error = %err, "symbol search failed, skipping");
                return Ok(None);
            }
            Err(err) => return Err(UniverseError::failure(spec.name(), err)),
        };

        let found = hits.into_iter().find(Ticker::has_exchange_suffix);
        if found.is_none() {
            warn!(name, query = query.as_str(), "no exchange-listed symbol, skipping");
        }
        Ok(found)
    }

    /// Store one company record per ticker tagged with `universe`.
    ///
    /// Metadata comes from the provider; tickers it cannot describe get a bare
    /// record. Existing records are kept. Returns the number of new records.
    ///
    /// # Errors
    /// Returns a store error if an insert fails.
    pub fn persist_companies(
        &self,
        universe: &str,
        tickers: &BTreeSet<Ticker>,
    ) -> Result<usize, UniverseError> {
        let mut inserted = 0;
        for (i, ticker) in tickers.iter().enumerate() {
            let record = self.company_info(i, ticker).unwrap_or_else(|err| {
                warn!(%ticker, error = %err, "no metadata, storing bare record");
                CompanyRecord::bare(ticker.clone())
            });
            if self.store.insert_company(&record.tagged(universe))? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Tickers of `tickers` with no sector-bearing record under `universe`.
    ///
    /// # Errors
    /// Returns a store error if the query fails.
    pub fn missing_metadata(
        &self,
        universe: &str,
        tickers: &BTreeSet<Ticker>,
    ) -> Result<BTreeSet<Ticker>, UniverseError> {
        let described: BTreeSet<Ticker> = self
            .store
            .query_companies(tickers, true)?
            .into_iter()
            .filter(|record| record.universe.as_deref() == Some(universe))
            .map(|record| record.ticker)
            .collect();
        Ok(tickers.difference(&described).cloned().collect())
    }

    /// Request metadata again for `tickers` and overwrite their records under
    /// `universe`. Tickers the provider still cannot describe are left as
    /// stored. Returns the number of records written.
    ///
    /// # Errors
    /// Returns a store error if a write fails.
    pub fn backfill_companies(
        &self,
        universe: &str,
        tickers: &BTreeSet<Ticker>,
    ) -> Result<usize, UniverseError> {
        let mut written = 0;
        for (i, ticker) in tickers.iter().enumerate() {
            match self.company_info(i, ticker) {
                Ok(record) => {
                    self.store.upsert_company(&record.tagged(universe))?;
                    written += 1;
                }
                Err(err) => warn!(%ticker, error = %err, "still no metadata"),
            }
        }
        debug!(universe, requested = tickers.len(), written, "backfilled company metadata");
        Ok(written)
    }

    fn company_info(&self, i: usize, ticker: &Ticker) -> Result<CompanyRecord, ProviderError> {
        if i > 0 && !self.metadata_pause.is_zero() {
            thread::sleep(self.metadata_pause);
        }
        let info = self.provider.company_info(ticker)?;
        Ok(CompanyRecord { ticker: ticker.clone(), ..info })
    }
}
