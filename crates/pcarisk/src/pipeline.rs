//! Pull-based facade over the pipeline stages.

use std::collections::BTreeSet;

use pcarisk_data::{
    PricePanel, Preprocessor, ReturnEngine, ReturnPanel, TimeSeriesLoader, WidePanel,
    daily_returns, monthly_returns, today,
};
use pcarisk_model::{
    FactorScores, Loadings, LongLoadings, PcaConfig, PcaEstimator, RiskReturnTable,
    SectorLoadings, risk_return_table,
};
use pcarisk_primitives::{CompanyRecord, Date, PriceField, Ticker};
use pcarisk_traits::{ListingSource, MarketDataProvider, MarketStore};
use pcarisk_universe::{IndexCatalog, UniverseResolver};
use tracing::{debug, info};

use crate::{PipelineConfig, PipelineError};

/// Entry point for the presentation layer.
///
/// Every accessor is a function of its arguments and the store contents;
/// nothing derived is cached between calls.
#[derive(Debug)]
pub struct Pipeline<S, L, P> {
    config: PipelineConfig,
    preprocessor: Preprocessor,
    store: S,
    listing: L,
    provider: P,
    today: Option<Date>,
}

impl<S, L, P> Pipeline<S, L, P>
where
    S: MarketStore,
    L: ListingSource,
    P: MarketDataProvider,
{
    /// Create a pipeline over a store, a listing source and a provider.
    ///
    /// # Errors
    /// Returns `Config` if the configuration is invalid.
    pub fn new(
        config: PipelineConfig,
        store: S,
        listing: L,
        provider: P,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let preprocessor = Preprocessor::new(config.min_coverage)?;
        Ok(Self { config, preprocessor, store, listing, provider, today: None })
    }

    /// Pin the date used as "today" for window clamping and updates.
    #[must_use]
    pub const fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    /// Configuration in use.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Underlying market data provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub(crate) fn today(&self) -> Date {
        self.today.unwrap_or_else(today)
    }

    pub(crate) fn resolver(&self) -> UniverseResolver<'_, S, L, P> {
        UniverseResolver::new(&self.store, &self.listing, &self.provider)
            .with_catalog(IndexCatalog::new(self.config.listing_base_url.clone()))
            .with_metadata_pause(self.config.metadata_pause())
    }

    fn loader(&self) -> TimeSeriesLoader<'_, S> {
        TimeSeriesLoader::new(&self.store, self.config.first_date).with_today(self.today())
    }

    /// Tickers of an index, from the store when cached.
    ///
    /// # Errors
    /// Returns `InvalidUniverse`, `ResolutionFailure` or `StoreUnavailable`.
    pub fn universe(&self, index_name: &str) -> Result<BTreeSet<Ticker>, PipelineError> {
        Ok(self.resolver().resolve(index_name)?)
    }

    /// Scrape an index again regardless of the cache.
    ///
    /// # Errors
    /// Same as [`universe`](Self::universe).
    pub fn refresh_universe(&self, index_name: &str) -> Result<BTreeSet<Ticker>, PipelineError> {
        Ok(self.resolver().refresh(index_name)?)
    }

    /// Raw price panel for `tickers`; see [`TimeSeriesLoader::load`].
    ///
    /// # Errors
    /// Returns `InvalidInput` on an unknown field or inverted window and
    /// `InsufficientData` when nothing is stored.
    pub fn panel(
        &self,
        tickers: &BTreeSet<Ticker>,
        field_list: &str,
        start: Option<Date>,
        end: Option<Date>,
        wide: bool,
    ) -> Result<PricePanel, PipelineError> {
        Ok(self.loader().load(tickers, field_list, start, end, wide)?)
    }

    /// Cleaned wide panel of one price field: sparse tickers dropped, gaps filled.
    ///
    /// # Errors
    /// Returns `InsufficientData` if nothing survives cleaning.
    pub fn prices(
        &self,
        tickers: &BTreeSet<Ticker>,
        field: PriceField,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<WidePanel, PipelineError> {
        let raw = self.panel(tickers, field.column_name(), start, end, true)?.into_wide()?;
        let cleaned = self.preprocessor.clean(&raw)?;
        debug!(
            requested = tickers.len(),
            kept = cleaned.n_tickers(),
            rows = cleaned.n_rows(),
            "prepared price panel"
        );
        Ok(cleaned)
    }

    /// Return views over the cleaned prices of one field.
    ///
    /// Daily returns are computed once and shared by the monthly view.
    ///
    /// # Errors
    /// Same as [`prices`](Self::prices).
    pub fn returns(
        &self,
        tickers: &BTreeSet<Ticker>,
        field: PriceField,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<ReturnEngine, PipelineError> {
        Ok(ReturnEngine::new(self.prices(tickers, field, start, end)?))
    }

    /// Simple daily returns of a price panel.
    ///
    /// # Errors
    /// Returns `InsufficientData` for fewer than two rows.
    pub fn daily_returns(&self, prices: &WidePanel) -> Result<ReturnPanel, PipelineError> {
        Ok(daily_returns(prices)?)
    }

    /// Daily returns compounded per calendar month.
    ///
    /// # Errors
    /// Returns `InsufficientData` for an empty panel.
    pub fn monthly_returns(&self, daily: &ReturnPanel) -> Result<ReturnPanel, PipelineError> {
        Ok(monthly_returns(daily)?)
    }

    /// Fit the configured number of components with the configured matrix kind.
    ///
    /// # Errors
    /// Returns `InsufficientAssets` when the panel has fewer tickers than
    /// components and `InsufficientData` when it has too few rows.
    pub fn fit_pca(&self, returns: &ReturnPanel) -> Result<Loadings, PipelineError> {
        self.fit_pca_with(returns, self.config.pca())
    }

    /// Fit with explicit settings.
    ///
    /// # Errors
    /// Same as [`fit_pca`](Self::fit_pca).
    pub fn fit_pca_with(
        &self,
        returns: &ReturnPanel,
        config: PcaConfig,
    ) -> Result<Loadings, PipelineError> {
        let loadings = PcaEstimator::with_config(config).fit(returns)?;
        info!(
            tickers = loadings.tickers().len(),
            components = loadings.n_components(),
            covariance = config.use_covariance,
            "fitted pca"
        );
        Ok(loadings)
    }

    fn companies_with_sector(
        &self,
        tickers: &[Ticker],
    ) -> Result<Vec<CompanyRecord>, PipelineError> {
        let wanted: BTreeSet<Ticker> = tickers.iter().cloned().collect();
        Ok(self.store.query_companies(&wanted, true)?)
    }

    /// Loadings restricted to tickers with a stored sector.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if companies cannot be read.
    pub fn sector_loadings(&self, loadings: &Loadings) -> Result<SectorLoadings, PipelineError> {
        let companies = self.companies_with_sector(loadings.tickers())?;
        Ok(loadings.combine_with_sectors(&companies))
    }

    /// One row per (ticker, component) ordered for sector-coloured charts.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if companies cannot be read.
    pub fn long_loadings(&self, loadings: &Loadings) -> Result<LongLoadings, PipelineError> {
        Ok(self.sector_loadings(loadings)?.transpose_for_plotting())
    }

    /// Project returns onto the fitted components.
    ///
    /// # Errors
    /// Returns `InvalidInput` if a loaded ticker is missing from `returns`.
    pub fn factor_scores(
        &self,
        loadings: &Loadings,
        returns: &ReturnPanel,
    ) -> Result<FactorScores, PipelineError> {
        Ok(loadings.transform(returns)?)
    }

    /// Mean and volatility of each ticker's returns, joined with its sector.
    ///
    /// # Errors
    /// Returns `InsufficientData` for fewer than two rows.
    pub fn risk_return_table(&self, returns: &ReturnPanel) -> Result<RiskReturnTable, PipelineError> {
        let companies = self.companies_with_sector(returns.tickers())?;
        Ok(risk_return_table(returns, &companies)?)
    }
}

#[cfg(all(feature = "store", feature = "sources"))]
impl
    Pipeline<
        pcarisk_store::SqliteStore,
        pcarisk_sources::WikipediaListing,
        pcarisk_sources::YahooProvider,
    >
{
    /// Pipeline over the SQLite file at `config.database_path`, Wikipedia
    /// listings and Yahoo Finance.
    ///
    /// # Errors
    /// Returns `Config` for an invalid configuration, `StoreUnavailable` if the
    /// database cannot be opened, or `Provider` if the HTTP clients fail to build.
    pub fn open(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let store = pcarisk_store::SqliteStore::open(&config.database_path)?;
        let client_error =
            |e: pcarisk_sources::SourceError| pcarisk_traits::ProviderError::Request(e.to_string());
        let listing =
            pcarisk_sources::WikipediaListing::new(config.http_timeout()).map_err(client_error)?;
        let provider =
            pcarisk_sources::YahooProvider::new(config.http_timeout()).map_err(client_error)?;
        Self::new(config, store, listing, provider)
    }
}
