//! Sector-attributed loadings.

use ndarray::Array2;
use pcarisk_primitives::Ticker;
use polars::prelude::{Column, DataFrame, PolarsResult};

/// Loadings restricted to tickers with a known sector.
#[derive(Debug, Clone)]
pub struct SectorLoadings {
    components: Vec<String>,
    tickers: Vec<Ticker>,
    sectors: Vec<String>,
    matrix: Array2<f64>,
}

impl SectorLoadings {
    pub(crate) const fn new(
        components: Vec<String>,
        tickers: Vec<Ticker>,
        sectors: Vec<String>,
        matrix: Array2<f64>,
    ) -> Self {
        Self { components, tickers, sectors, matrix }
    }

    /// Component labels.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Row tickers.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Sector of each row.
    #[must_use]
    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    /// The (tickers × components) loadings.
    #[must_use]
    pub const fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Check if no ticker survived the join.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// One row per (ticker, component), stably ordered by sector.
    #[must_use]
    pub fn transpose_for_plotting(&self) -> LongLoadings {
        let mut rows = Vec::with_capacity(self.matrix.len());
        for (k, component) in self.components.iter().enumerate() {
            for (i, (ticker, sector)) in self.tickers.iter().zip(&self.sectors).enumerate() {
                rows.push(LongLoading {
                    ticker: ticker.clone(),
                    sector: sector.clone(),
                    component: component.clone(),
                    loading: self.matrix[[i, k]],
                });
            }
        }
        rows.sort_by(|a, b| a.sector.cmp(&b.sector));
        LongLoadings { rows }
    }

    /// Frame with `ticker`, `sector`, then one column per component.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let tickers: Vec<&str> = self.tickers.iter().map(Ticker::as_str).collect();
        let mut columns = vec![
            Column::new("ticker".into(), tickers),
            Column::new("sector".into(), self.sectors.clone()),
        ];
        for (k, name) in self.components.iter().enumerate() {
            columns.push(Column::new(name.as_str().into(), self.matrix.column(k).to_vec()));
        }
        DataFrame::new(columns)
    }
}

/// A single (ticker, component) loading with its sector.
#[derive(Debug, Clone, PartialEq)]
pub struct LongLoading {
    /// Instrument.
    pub ticker: Ticker,
    /// Sector of the instrument.
    pub sector: String,
    /// Component label.
    pub component: String,
    /// Loading value.
    pub loading: f64,
}

/// Long form of [`SectorLoadings`], ready for per-sector charts.
#[derive(Debug, Clone, Default)]
pub struct LongLoadings {
    rows: Vec<LongLoading>,
}

impl LongLoadings {
    /// Rows ordered by sector.
    #[must_use]
    pub fn rows(&self) -> &[LongLoading] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Frame with columns `ticker`, `sector`, `component`, `loading`.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let tickers: Vec<&str> = self.rows.iter().map(|r| r.ticker.as_str()).collect();
        let sectors: Vec<&str> = self.rows.iter().map(|r| r.sector.as_str()).collect();
        let components: Vec<&str> = self.rows.iter().map(|r| r.component.as_str()).collect();
        let loadings: Vec<f64> = self.rows.iter().map(|r| r.loading).collect();
        DataFrame::new(vec![
            Column::new("ticker".into(), tickers),
            Column::new("sector".into(), sectors),
            Column::new("component".into(), components),
            Column::new("loading".into(), loadings),
        ])
    }
}
