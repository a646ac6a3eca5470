//! SQLite market store backed by diesel.

use std::{collections::BTreeSet, path::Path};

use diesel::{connection::SimpleConnection, dsl::max, prelude::*};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pcarisk_primitives::{
    BarRow, CompanyRecord, DATE_FORMAT, Date, PriceBar, PriceField, Ticker,
};
use pcarisk_traits::{MarketStore, StoreError};
use tracing::{debug, info};

use crate::schema::{companies, stocks};

/// Embedded diesel migrations creating the `stocks` and `companies` tables.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn query_error(err: diesel::result::Error) -> StoreError {
    StoreError::Query(err.to_string())
}

fn nullable(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<Date, StoreError> {
    Date::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("date {raw:?}: {e}")))
}

#[derive(Insertable, Debug)]
#[diesel(table_name = stocks)]
struct NewStock<'a> {
    symbol: &'a str,
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    adj_close: Option<f64>,
    volume: Option<i64>,
}

impl<'a> From<&'a PriceBar> for NewStock<'a> {
    fn from(bar: &'a PriceBar) -> Self {
        Self {
            symbol: bar.ticker.as_str(),
            date: format_date(bar.date),
            open: nullable(bar.open),
            high: nullable(bar.high),
            low: nullable(bar.low),
            close: nullable(bar.close),
            adj_close: nullable(bar.adj_close),
            volume: i64::try_from(bar.volume).ok(),
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = companies)]
struct NewCompany<'a> {
    symbol: &'a str,
    universe: &'a str,
    name: Option<&'a str>,
    exchange: Option<&'a str>,
    industry: Option<&'a str>,
    sector: Option<&'a str>,
    market_cap: Option<f64>,
    book_value: Option<f64>,
    beta: Option<f64>,
}

impl<'a> From<&'a CompanyRecord> for NewCompany<'a> {
    fn from(record: &'a CompanyRecord) -> Self {
        Self {
            symbol: record.ticker.as_str(),
            universe: record.universe.as_deref().unwrap_or_default(),
            name: record.name.as_deref(),
            exchange: record.exchange.as_deref(),
            industry: record.industry.as_deref(),
            sector: record.sector.as_deref(),
            market_cap: record.market_cap,
            book_value: record.book_value,
            beta: record.beta,
        }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = companies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct CompanyRow {
    symbol: String,
    universe: String,
    name: Option<String>,
    exchange: Option<String>,
    industry: Option<String>,
    sector: Option<String>,
    market_cap: Option<f64>,
    book_value: Option<f64>,
    beta: Option<f64>,
}

impl From<CompanyRow> for CompanyRecord {
    fn from(row: CompanyRow) -> Self {
        Self {
            ticker: Ticker::new(row.symbol),
            name: row.name,
            exchange: row.exchange,
            industry: row.industry,
            sector: row.sector,
            market_cap: row.market_cap,
            book_value: row.book_value,
            beta: row.beta,
            universe: (!row.universe.is_empty()).then_some(row.universe),
        }
    }
}

type StockRow = (
    String,
    String,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

fn project(row: StockRow, fields: &[PriceField]) -> Result<BarRow, StoreError> {
    let (symbol, date, open, high, low, close, adj_close) = row;
    let values = fields
        .iter()
        .map(|field| {
            match field {
                PriceField::Open => open,
                PriceField::High => high,
                PriceField::Low => low,
                PriceField::Close => close,
                PriceField::AdjClose => adj_close,
            }
            .unwrap_or(f64::NAN)
        })
        .collect();
    Ok(BarRow { date: parse_date(&date)?, ticker: Ticker::new(symbol), values })
}

/// Market store in a SQLite file.
///
/// Each trait call opens a fresh connection and drops it before returning.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    url: String,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and run pending migrations.
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` if the file cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self { url: path.as_ref().to_string_lossy().into_owned() };
        let mut conn = store.connect()?;
        conn.batch_execute("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        info!(url = %store.url, migrations = applied.len(), "opened sqlite store");
        Ok(store)
    }

    /// Database location.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn connect(&self) -> Result<SqliteConnection, StoreError> {
        let mut conn = SqliteConnection::establish(&self.url)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.batch_execute("PRAGMA busy_timeout=5000;")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(conn)
    }
}

impl MarketStore for SqliteStore {
    fn insert_bar(&self, bar: &PriceBar) -> Result<bool, StoreError> {
        let mut conn = self.connect()?;
        let inserted = diesel::insert_or_ignore_into(stocks::table)
            .values(NewStock::from(bar))
            .execute(&mut conn)
            .map_err(query_error)?;
        Ok(inserted > 0)
    }

    fn insert_bars(&self, bars: &[PriceBar]) -> Result<usize, StoreError> {
        let mut conn = self.connect()?;
        let inserted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                let mut inserted = 0;
                for bar in bars {
                    inserted += diesel::insert_or_ignore_into(stocks::table)
                        .values(NewStock::from(bar))
                        .execute(conn)?;
                }
                Ok(inserted)
            })
            .map_err(query_error)?;
        debug!(offered = bars.len(), inserted, "inserted bars");
        Ok(inserted)
    }

    fn insert_company(&self, record: &CompanyRecord) -> Result<bool, StoreError> {
        let mut conn = self.connect()?;
        let inserted = diesel::insert_or_ignore_into(companies::table)
            .values(NewCompany::from(record))
            .execute(&mut conn)
            .map_err(query_error)?;
        Ok(inserted > 0)
    }

    fn upsert_company(&self, record: &CompanyRecord) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        diesel::replace_into(companies::table)
            .values(NewCompany::from(record))
            .execute(&mut conn)
            .map_err(query_error)?;
        Ok(())
    }

    fn retain_universe(
        &self,
        universe: &str,
        tickers: &BTreeSet<Ticker>,
    ) -> Result<usize, StoreError> {
        let symbols: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
        let mut conn = self.connect()?;
        let removed = diesel::delete(
            companies::table
                .filter(companies::universe.eq(universe))
                .filter(companies::symbol.ne_all(symbols)),
        )
        .execute(&mut conn)
        .map_err(query_error)?;
        debug!(universe, removed, "pruned universe");
        Ok(removed)
    }

    fn query_bars(
        &self,
        tickers: &BTreeSet<Ticker>,
        start: Date,
        end: Date,
        fields: &[PriceField],
    ) -> Result<Vec<BarRow>, StoreError> {
        let symbols: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
        let mut conn = self.connect()?;
        let rows: Vec<StockRow> = stocks::table
            .filter(stocks::symbol.eq_any(symbols))
            .filter(stocks::date.between(format_date(start), format_date(end)))
            .order((stocks::date.asc(), stocks::symbol.asc()))
            .select((
                stocks::symbol,
                stocks::date,
                stocks::open,
                stocks::high,
                stocks::low,
                stocks::close,
                stocks::adj_close,
            ))
            .load(&mut conn)
            .map_err(query_error)?;

        rows.into_iter().map(|row| project(row, fields)).collect()
    }

    fn query_companies(
        &self,
        tickers: &BTreeSet<Ticker>,
        require_sector: bool,
    ) -> Result<Vec<CompanyRecord>, StoreError> {
        let symbols: Vec<String> = tickers.iter().map(|t| t.as_str().to_string()).collect();
        let mut query = companies::table
            .filter(companies::symbol.eq_any(symbols))
            .order((companies::symbol.asc(), companies::universe.asc()))
            .select(CompanyRow::as_select())
            .into_boxed();
        if require_sector {
            query = query.filter(companies::sector.is_not_null());
        }

        let mut conn = self.connect()?;
        let rows = query.load::<CompanyRow>(&mut conn).map_err(query_error)?;
        Ok(rows.into_iter().map(CompanyRecord::from).collect())
    }

    fn query_distinct_tickers(&self, universe: &str) -> Result<BTreeSet<Ticker>, StoreError> {
        let mut conn = self.connect()?;
        let symbols: Vec<String> = companies::table
            .filter(companies::universe.eq(universe))
            .select(companies::symbol)
            .distinct()
            .load(&mut conn)
            .map_err(query_error)?;
        Ok(symbols.into_iter().map(Ticker::new).collect())
    }

    fn latest_bar_date(&self) -> Result<Option<Date>, StoreError> {
        let mut conn = self.connect()?;
        let latest: Option<String> = stocks::table
            .select(max(stocks::date))
            .first(&mut conn)
            .map_err(query_error)?;
        latest.as_deref().map(parse_date).transpose()
    }

    fn latest_bar_date_for(&self, ticker: &Ticker) -> Result<Option<Date>, StoreError> {
        let mut conn = self.connect()?;
        let latest: Option<String> = stocks::table
            .filter(stocks::symbol.eq(ticker.as_str()))
            .select(max(stocks::date))
            .first(&mut conn)
            .map_err(query_error)?;
        latest.as_deref().map(parse_date).transpose()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    struct TempStore {
        store: SqliteStore,
        _dir: TempDir,
    }

    #[fixture]
    fn temp() -> TempStore {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("market.db")).unwrap();
        TempStore { store, _dir: dir }
    }

    fn d(month: u32, day: u32) -> Date {
        Date::from_ymd_opt(2024, month, day).unwrap()
    }

    fn bar(date: Date, ticker: &str, close: f64) -> PriceBar {
        PriceBar {
            date,
            ticker: Ticker::new(ticker),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            adj_close: f64::NAN,
            volume: 1_234,
        }
    }

    #[rstest]
    fn bars_round_trip(temp: TempStore) {
        let store = &temp.store;
        let bars = [bar(d(1, 3), "SAP.DE", 101.0), bar(d(1, 2), "SAP.DE", 100.0), bar(d(1, 2), "BMW.DE", 80.0)];
        assert_eq!(store.insert_bars(&bars).unwrap(), 3);

        let tickers = BTreeSet::from([Ticker::new("SAP.DE"), Ticker::new("BMW.DE")]);
        let rows = store
            .query_bars(&tickers, d(1, 1), d(1, 31), &[PriceField::Close, PriceField::AdjClose])
            .unwrap();

        let keys: Vec<(Date, &str)> = rows.iter().map(|r| (r.date, r.ticker.as_str())).collect();
        assert_eq!(keys, vec![(d(1, 2), "BMW.DE"), (d(1, 2), "SAP.DE"), (d(1, 3), "SAP.DE")]);
        assert_eq!(rows[1].values[0], 100.0);
        assert!(rows[1].values[1].is_nan());
    }

    #[rstest]
    fn duplicate_bar_is_ignored(temp: TempStore) {
        let store = &temp.store;
        assert!(store.insert_bar(&bar(d(2, 1), "SAP.DE", 100.0)).unwrap());
        assert!(!store.insert_bar(&bar(d(2, 1), "SAP.DE", 500.0)).unwrap());
        assert_eq!(store.insert_bars(&[bar(d(2, 1), "SAP.DE", 7.0)]).unwrap(), 0);

        let tickers = BTreeSet::from([Ticker::new("SAP.DE")]);
        let rows = store.query_bars(&tickers, d(2, 1), d(2, 1), &[PriceField::Close]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values, vec![100.0]);
    }

    #[rstest]
    fn date_window_is_inclusive(temp: TempStore) {
        let store = &temp.store;
        let bars: Vec<PriceBar> = (1..=5).map(|day| bar(d(3, day), "SAP.DE", f64::from(day))).collect();
        store.insert_bars(&bars).unwrap();

        let tickers = BTreeSet::from([Ticker::new("SAP.DE")]);
        let rows = store.query_bars(&tickers, d(3, 2), d(3, 4), &[PriceField::Close]).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(store.latest_bar_date().unwrap(), Some(d(3, 5)));
    }

    #[rstest]
    fn latest_bar_date_per_ticker(temp: TempStore) {
        let store = &temp.store;
        store.insert_bars(&[bar(d(4, 1), "SAP.DE", 1.0), bar(d(4, 9), "BMW.DE", 2.0)]).unwrap();
        assert_eq!(store.latest_bar_date_for(&Ticker::new("SAP.DE")).unwrap(), Some(d(4, 1)));
        assert_eq!(store.latest_bar_date_for(&Ticker::new("ALV.DE")).unwrap(), None);
    }

    #[rstest]
    fn upsert_fills_in_sector(temp: TempStore) {
        let store = &temp.store;
        let bare = CompanyRecord::bare(Ticker::new("BMW.DE")).tagged("DAX");
        assert!(store.insert_company(&bare).unwrap());

        let filled = CompanyRecord { sector: Some("Consumer Cyclical".to_string()), ..bare };
        store.upsert_company(&filled).unwrap();
        store.upsert_company(&filled).unwrap();

        let tickers = BTreeSet::from([Ticker::new("BMW.DE")]);
        assert_eq!(store.query_companies(&tickers, false).unwrap(), vec![filled]);
    }

    #[rstest]
    fn retain_universe_prunes_one_tag(temp: TempStore) {
        let store = &temp.store;
        for (ticker, tag) in [("SAP.DE", "DAX"), ("ALV.DE", "DAX"), ("ALV.DE", "DAX-COMPOSITE")] {
            store.insert_company(&CompanyRecord::bare(Ticker::new(ticker)).tagged(tag)).unwrap();
        }

        let kept = BTreeSet::from([Ticker::new("SAP.DE")]);
        assert_eq!(store.retain_universe("DAX", &kept).unwrap(), 1);
        assert_eq!(store.query_distinct_tickers("DAX").unwrap(), kept);
        assert_eq!(
            store.query_distinct_tickers("DAX-COMPOSITE").unwrap(),
            BTreeSet::from([Ticker::new("ALV.DE")])
        );
    }

    #[rstest]
    fn companies_round_trip(temp: TempStore) {
        let store = &temp.store;
        let sap = CompanyRecord {
            name: Some("SAP SE".to_string()),
            sector: Some("Technology".to_string()),
            market_cap: Some(2.0e11),
            ..CompanyRecord::bare(Ticker::new("SAP.DE"))
        }
        .tagged("DAX");
        assert!(store.insert_company(&sap).unwrap());
        assert!(!store.insert_company(&sap).unwrap());
        assert!(store.insert_company(&CompanyRecord::bare(Ticker::new("HFG.DE")).tagged("MDAX")).unwrap());

        let all = BTreeSet::from([Ticker::new("SAP.DE"), Ticker::new("HFG.DE")]);
        let records = store.query_companies(&all, false).unwrap();
        assert_eq!(records.len(), 2);

        let with_sector = store.query_companies(&all, true).unwrap();
        assert_eq!(with_sector, vec![sap]);

        assert_eq!(
            store.query_distinct_tickers("MDAX").unwrap(),
            BTreeSet::from([Ticker::new("HFG.DE")])
        );
    }

    #[rstest]
    fn empty_database(temp: TempStore) {
        assert_eq!(temp.store.latest_bar_date().unwrap(), None);
        assert!(temp.store.query_distinct_tickers("DAX").unwrap().is_empty());
    }

    #[test]
    fn unreachable_path() {
        let result = SqliteStore::open("/nonexistent-dir/for/sure/market.db");
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
