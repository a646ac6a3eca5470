//! End-to-end pipeline tests over in-process sources.
#![allow(missing_docs)]

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use approx::assert_relative_eq;
use chrono::{Datelike, Weekday};
use pcarisk::{
    IngestReport, Pipeline, PipelineConfig, PipelineError,
    data::Frequency,
    model::PcaConfig,
    primitives::{CompanyRecord, Date, PriceBar, PriceField, Ticker},
    store::{MemoryStore, SqliteStore},
    traits::{ListingError, ListingSource, MarketDataProvider, MarketStore, ProviderError},
};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use rstest::{fixture, rstest};

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd_opt(y, m, day).unwrap()
}

struct StaticListing;

impl ListingSource for StaticListing {
    fn table_column(
        &self,
        url: &str,
        table_id: &str,
        column: &str,
    ) -> Result<Vec<String>, ListingError> {
        match (url, column) {
            ("http://listings.test/DAX", "Ticker") => {
                Ok(["SAP", "SIE", "ALV.DE", "BMW", "DBK[1]"].map(String::from).to_vec())
            }
            _ => Err(ListingError::TableNotFound {
                url: url.to_string(),
                table_id: table_id.to_string(),
            }),
        }
    }
}

/// Provider serving one year of synthetic one-factor prices.
struct SyntheticProvider {
    bars: BTreeMap<Ticker, Vec<PriceBar>>,
    sectors: RwLock<BTreeMap<Ticker, &'static str>>,
    downloads: AtomicUsize,
    info_calls: AtomicUsize,
}

impl SyntheticProvider {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(7);
        let market = Normal::new(0.0, 0.01).unwrap();
        let noise = Normal::new(0.0, 0.006).unwrap();
        let betas = [("SAP.DE", 1.2), ("SIE.DE", 1.0), ("ALV.DE", 0.8), ("BMW.DE", 1.1), ("DBK.DE", 1.4)];

        let days: Vec<Date> = d(2023, 1, 2)
            .iter_days()
            .take_while(|day| *day <= d(2023, 12, 29))
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();

        let mut prices = vec![100.0; betas.len()];
        let mut bars: BTreeMap<Ticker, Vec<PriceBar>> = BTreeMap::new();
        for (t, day) in days.iter().enumerate() {
            let m = market.sample(&mut rng);
            for (j, (ticker, beta)) in betas.iter().enumerate() {
                prices[j] *= 1.0 + beta * m + noise.sample(&mut rng);
                // DBK.DE only trades every other day
                if *ticker == "DBK.DE" && t % 2 == 1 {
                    continue;
                }
                bars.entry(Ticker::new(ticker)).or_default().push(PriceBar {
                    date: *day,
                    ticker: Ticker::new(ticker),
                    open: prices[j],
                    high: prices[j] * 1.01,
                    low: prices[j] * 0.99,
                    close: prices[j],
                    adj_close: prices[j],
                    volume: 1_000,
                });
            }
        }

        let sectors = BTreeMap::from([
            (Ticker::new("SAP.DE"), "Technology"),
            (Ticker::new("SIE.DE"), "Industrials"),
            (Ticker::new("ALV.DE"), "Financial Services"),
            (Ticker::new("DBK.DE"), "Financial Services"),
        ]);
        Self {
            bars,
            sectors: RwLock::new(sectors),
            downloads: AtomicUsize::new(0),
            info_calls: AtomicUsize::new(0),
        }
    }

    fn describe(&self, ticker: &str, sector: &'static str) {
        self.sectors.write().unwrap().insert(Ticker::new(ticker), sector);
    }

    fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn download_bars(
        &self,
        tickers: &BTreeSet<Ticker>,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(tickers
            .iter()
            .filter_map(|t| self.bars.get(t))
            .flatten()
            .filter(|bar| start <= bar.date && bar.date <= end)
            .cloned()
            .collect())
    }

    fn company_info(&self, ticker: &Ticker) -> Result<CompanyRecord, ProviderError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        // BMW.DE has no metadata and ends up as a bare record
        let sectors = self.sectors.read().unwrap();
        let sector = sectors.get(ticker).ok_or_else(|| ProviderError::Unavailable(ticker.clone()))?;
        Ok(CompanyRecord {
            name: Some(format!("{ticker} AG")),
            sector: Some((*sector).to_string()),
            ..CompanyRecord::bare(ticker.clone())
        })
    }

    fn search_symbol(&self, _query: &str) -> Result<Vec<Ticker>, ProviderError> {
        Ok(Vec::new())
    }
}

fn config() -> PipelineConfig {
    PipelineConfig {
        first_date: d(2023, 1, 1),
        listing_base_url: "http://listings.test".to_string(),
        metadata_pause_ms: 0,
        ..PipelineConfig::default()
    }
}

type TestPipeline<S> = Pipeline<S, StaticListing, SyntheticProvider>;

fn populated<S: MarketStore>(store: S) -> TestPipeline<S> {
    let pipeline = Pipeline::new(config(), store, StaticListing, SyntheticProvider::new())
        .unwrap()
        .with_today(d(2023, 12, 31));
    pipeline.populate_prices("DAX", None).unwrap();
    pipeline
}

#[fixture]
fn pipeline() -> TestPipeline<MemoryStore> {
    populated(MemoryStore::new())
}

#[rstest]
fn universe_is_cached_and_suffixed(pipeline: TestPipeline<MemoryStore>) {
    let universe = pipeline.universe("dax").unwrap();
    let expected: BTreeSet<Ticker> =
        ["ALV.DE", "BMW.DE", "DBK.DE", "SAP.DE", "SIE.DE"].into_iter().map(Ticker::new).collect();
    assert_eq!(universe, expected);
    assert_eq!(pipeline.store().query_distinct_tickers("DAX").unwrap(), expected);
    assert_eq!(pipeline.store().company_count().unwrap(), 5);
}

#[rstest]
fn unknown_universe(pipeline: TestPipeline<MemoryStore>) {
    assert!(matches!(pipeline.universe("NIKKEI"), Err(PipelineError::InvalidUniverse(_))));
    assert!(matches!(
        pipeline.universe("MDAX"),
        Err(PipelineError::ResolutionFailure { index, .. }) if index == "MDAX"
    ));
}

#[rstest]
fn ingestion_is_idempotent(pipeline: TestPipeline<MemoryStore>) {
    let stored = pipeline.store().bar_count().unwrap();
    let again = pipeline.populate_prices("DAX", None).unwrap();
    assert_eq!(again.tickers, 5);
    assert_eq!(again.received, stored);
    assert_eq!(again.inserted, 0);
    assert_eq!(again.ignored(), stored);

    let update = pipeline.update_prices("DAX").unwrap();
    assert_eq!(update.tickers, 5);
    assert_eq!(update.inserted, 0);
    assert_eq!(pipeline.store().latest_bar_date().unwrap(), Some(d(2023, 12, 29)));
    // DBK.DE last traded on the 28th and resumes in its own batch
    assert_eq!(pipeline.provider().downloads.load(Ordering::SeqCst), 4);

    // only the sector-less BMW.DE is asked for again
    let companies = pipeline.populate_companies("DAX").unwrap();
    assert_eq!(companies, IngestReport { tickers: 5, received: 1, inserted: 0 });
    assert_eq!(pipeline.provider().info_calls(), 6);
}

#[test]
fn company_metadata_is_fetched_once_then_backfilled() {
    let pipeline = Pipeline::new(config(), MemoryStore::new(), StaticListing, SyntheticProvider::new())
        .unwrap()
        .with_today(d(2023, 12, 31));

    let cold = pipeline.populate_companies("DAX").unwrap();
    assert_eq!(cold, IngestReport { tickers: 5, received: 5, inserted: 5 });
    assert_eq!(pipeline.provider().info_calls(), 5);

    let bmw = BTreeSet::from([Ticker::new("BMW.DE")]);
    assert!(pipeline.store().query_companies(&bmw, true).unwrap().is_empty());

    pipeline.provider().describe("BMW.DE", "Consumer Cyclical");
    let warm = pipeline.populate_companies("DAX").unwrap();
    assert_eq!(warm, IngestReport { tickers: 5, received: 1, inserted: 1 });
    assert_eq!(pipeline.provider().info_calls(), 6);
    assert_eq!(pipeline.store().company_count().unwrap(), 5);

    let records = pipeline.store().query_companies(&bmw, true).unwrap();
    assert_eq!(records[0].sector.as_deref(), Some("Consumer Cyclical"));

    let done = pipeline.populate_companies("DAX").unwrap();
    assert_eq!(done, IngestReport { tickers: 5, received: 0, inserted: 0 });
    assert_eq!(pipeline.provider().info_calls(), 6);
}

#[test]
fn update_backfills_tickers_without_bars() {
    let provider = SyntheticProvider::new();
    let total: usize = provider.bars.values().map(Vec::len).sum();
    let early: Vec<PriceBar> = provider.bars[&Ticker::new("SAP.DE")]
        .iter()
        .filter(|bar| bar.date <= d(2023, 6, 30))
        .cloned()
        .collect();

    let store = MemoryStore::new();
    store.insert_bars(&early).unwrap();
    let pipeline = Pipeline::new(config(), store, StaticListing, provider)
        .unwrap()
        .with_today(d(2023, 12, 31));

    let report = pipeline.update_prices("DAX").unwrap();
    assert_eq!(report.tickers, 5);
    assert_eq!(report.inserted, total - early.len());
    assert_eq!(report.ignored(), 0);
    assert_eq!(pipeline.provider().downloads.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.store().bar_count().unwrap(), total);

    let bmw = BTreeSet::from([Ticker::new("BMW.DE")]);
    let first =
        pipeline.store().query_bars(&bmw, d(2023, 1, 1), d(2023, 1, 6), &[PriceField::Close]).unwrap();
    assert_eq!(first[0].date, d(2023, 1, 2));

    let current = pipeline.update_prices("DAX").unwrap();
    assert_eq!(current, IngestReport { tickers: 5, received: 0, inserted: 0 });
    assert_eq!(pipeline.provider().downloads.load(Ordering::SeqCst), 4);
}

#[rstest]
fn long_panel_for_candlesticks(pipeline: TestPipeline<MemoryStore>) {
    let tickers = BTreeSet::from([Ticker::new("SAP.DE")]);
    let panel = pipeline
        .panel(&tickers, "open, high, low, close", Some(d(2023, 3, 1)), Some(d(2023, 3, 31)), true)
        .unwrap();
    assert!(!panel.is_wide());

    let long = panel.into_long();
    assert_eq!(long.fields(), &[PriceField::Open, PriceField::High, PriceField::Low, PriceField::Close]);
    assert_eq!(long.len(), 23);
    assert!(long.rows().windows(2).all(|w| w[0].date < w[1].date));

    let frame = long.to_frame().unwrap();
    assert_eq!(frame.height(), 23);
}

#[rstest]
fn unknown_field_is_invalid_input(pipeline: TestPipeline<MemoryStore>) {
    let tickers = BTreeSet::from([Ticker::new("SAP.DE")]);
    let result = pipeline.panel(&tickers, "close,vwap", None, None, true);
    assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
}

#[rstest]
fn sparse_ticker_is_dropped(pipeline: TestPipeline<MemoryStore>) {
    let universe = pipeline.universe("DAX").unwrap();
    let prices = pipeline.prices(&universe, PriceField::AdjClose, None, None).unwrap();

    assert!(!prices.tickers().contains(&Ticker::new("DBK.DE")));
    assert_eq!(prices.n_tickers(), 4);
    assert_eq!(prices.missing_count(), 0);
}

#[rstest]
fn returns_and_factor_model(pipeline: TestPipeline<MemoryStore>) {
    let universe = pipeline.universe("DAX").unwrap();
    let prices = pipeline.prices(&universe, PriceField::AdjClose, None, None).unwrap();

    let daily = pipeline.daily_returns(&prices).unwrap();
    assert_eq!(daily.n_rows(), prices.n_rows() - 1);
    assert_eq!(daily.frequency(), Frequency::Daily);

    let monthly = pipeline.monthly_returns(&daily).unwrap();
    assert_eq!(monthly.n_rows(), 12);
    assert_eq!(monthly.dates()[0], d(2023, 1, 31));

    let engine = pipeline.returns(&universe, PriceField::AdjClose, None, None).unwrap();
    assert_eq!(engine.prices().tickers(), prices.tickers());
    assert_eq!(engine.daily().unwrap().dates(), daily.dates());
    assert_eq!(engine.monthly().unwrap().dates(), monthly.dates());

    let err = pipeline.fit_pca(&daily).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientAssets { requested: 10, available: 4 }));

    let loadings =
        pipeline.fit_pca_with(&daily, PcaConfig { use_covariance: false, n_components: 4 }).unwrap();
    assert_relative_eq!(loadings.cumulative_variance_ratio()[3], 1.0, epsilon = 1e-9);
    // one common factor dominates
    assert!(loadings.explained_variance_ratio()[0] > 0.6);
    assert!(loadings.component(0).unwrap().iter().all(|&w| w > 0.0));

    let sector = pipeline.sector_loadings(&loadings).unwrap();
    assert_eq!(sector.tickers().len(), 3);
    assert!(!sector.tickers().contains(&Ticker::new("BMW.DE")));

    let long = pipeline.long_loadings(&loadings).unwrap();
    assert_eq!(long.len(), 3 * 4);
    assert_eq!(long.rows()[0].component, "PC1");

    let scores = pipeline.factor_scores(&loadings, &daily).unwrap();
    assert_eq!(scores.dates(), daily.dates());
    assert_eq!(scores.to_frame().unwrap().width(), 1 + 4);

    let table = pipeline.risk_return_table(&monthly).unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.rows().iter().all(|row| row.vol > 0.0));
}

#[test]
fn sqlite_backed_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("markets.sqlite")).unwrap();
    let pipeline = populated(store);

    let universe = pipeline.universe("DAX").unwrap();
    assert_eq!(universe.len(), 5);

    let prices = pipeline.prices(&universe, PriceField::Close, None, None).unwrap();
    let daily = pipeline.daily_returns(&prices).unwrap();
    let loadings =
        pipeline.fit_pca_with(&daily, PcaConfig { use_covariance: true, n_components: 2 }).unwrap();
    assert_eq!(loadings.components(), &["PC1".to_string(), "PC2".to_string()]);
    assert_eq!(pipeline.sector_loadings(&loadings).unwrap().tickers().len(), 3);
}

#[test]
fn config_is_validated_on_construction() {
    let bad = PipelineConfig { min_coverage: 0.0, ..config() };
    let result = Pipeline::new(bad, MemoryStore::new(), StaticListing, SyntheticProvider::new());
    assert!(matches!(result, Err(PipelineError::Config(_))));
}
