//! Retained principal components.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use pcarisk_data::ReturnPanel;
use pcarisk_primitives::{CompanyRecord, Ticker};
use polars::prelude::{Column, DataFrame, PolarsResult};

use crate::{FactorScores, MatrixKind, ModelError, SectorLoadings};

/// Loadings of the retained components `PC1..PCn`.
///
/// `matrix` is (tickers × components); column `k` is the unit eigenvector of
/// component `k + 1`.
#[derive(Debug, Clone)]
pub struct Loadings {
    kind: MatrixKind,
    tickers: Vec<Ticker>,
    components: Vec<String>,
    matrix: Array2<f64>,
    eigenvalues: Array1<f64>,
    ratios: Array1<f64>,
    cumulative: Array1<f64>,
}

impl Loadings {
    pub(crate) fn new(
        kind: MatrixKind,
        tickers: Vec<Ticker>,
        matrix: Array2<f64>,
        eigenvalues: Array1<f64>,
        ratios: Array1<f64>,
        cumulative: Array1<f64>,
    ) -> Self {
        let components = (1..=matrix.ncols()).map(|k| format!("PC{k}")).collect();
        Self { kind, tickers, components, matrix, eigenvalues, ratios, cumulative }
    }

    /// Matrix kind the components came from.
    #[must_use]
    pub const fn kind(&self) -> MatrixKind {
        self.kind
    }

    /// Row labels.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Column labels `PC1..PCn`.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Number of retained components.
    #[must_use]
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// The (tickers × components) loadings matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Eigenvalues of the retained components.
    #[must_use]
    pub const fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Explained-variance ratio of each retained component, against the full spectrum.
    #[must_use]
    pub const fn explained_variance_ratio(&self) -> &Array1<f64> {
        &self.ratios
    }

    /// Cumulative explained-variance ratio.
    #[must_use]
    pub const fn cumulative_variance_ratio(&self) -> &Array1<f64> {
        &self.cumulative
    }

    /// Loading of `ticker` on component `k` (zero-based).
    #[must_use]
    pub fn get(&self, ticker: &Ticker, k: usize) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == ticker)?;
        self.matrix.get([i, k]).copied()
    }

    /// Loadings of component `k` (zero-based).
    #[must_use]
    pub fn component(&self, k: usize) -> Option<ArrayView1<'_, f64>> {
        (k < self.n_components()).then(|| self.matrix.column(k))
    }

    /// The `top` tickers with the largest absolute loading on component `k`.
    #[must_use]
    pub fn top_contributors(&self, k: usize, top: usize) -> Vec<(Ticker, f64)> {
        let Some(column) = self.component(k) else {
            return Vec::new();
        };
        let mut ranked: Vec<(Ticker, f64)> =
            self.tickers.iter().cloned().zip(column.iter().copied()).collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked.truncate(top);
        ranked
    }

    /// Inner-join with company sectors; tickers without a sector are dropped.
    #[must_use]
    pub fn combine_with_sectors(&self, companies: &[CompanyRecord]) -> SectorLoadings {
        let mut sectors: BTreeMap<&Ticker, &str> = BTreeMap::new();
        for company in companies {
            if let Some(sector) = company.sector.as_deref() {
                sectors.entry(&company.ticker).or_insert(sector);
            }
        }

        let (rows, labels): (Vec<usize>, Vec<(Ticker, String)>) = self
            .tickers
            .iter()
            .enumerate()
            .filter_map(|(i, t)| sectors.get(t).map(|s| (i, (t.clone(), (*s).to_string()))))
            .unzip();
        let (tickers, sectors) = labels.into_iter().unzip();

        SectorLoadings::new(
            self.components.clone(),
            tickers,
            sectors,
            self.matrix.select(Axis(0), &rows),
        )
    }

    /// Project returns onto the components: `returns · loadings`.
    ///
    /// Returns are used as given, not demeaned.
    ///
    /// # Errors
    /// Returns error if a loadings ticker is absent from `returns`.
    pub fn transform(&self, returns: &ReturnPanel) -> Result<FactorScores, ModelError> {
        let positions = self
            .tickers
            .iter()
            .map(|t| {
                returns
                    .tickers()
                    .iter()
                    .position(|r| r == t)
                    .ok_or_else(|| ModelError::MissingTicker(t.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let aligned = returns.values().select(Axis(1), &positions);
        let scores = aligned.dot(&self.matrix);
        FactorScores::new(returns.frequency(), returns.dates().to_vec(), self.components.clone(), scores)
    }

    /// Loadings as a frame: `ticker` then one column per component.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let tickers: Vec<&str> = self.tickers.iter().map(Ticker::as_str).collect();
        let mut columns = vec![Column::new("ticker".into(), tickers)];
        for (k, name) in self.components.iter().enumerate() {
            columns.push(Column::new(name.as_str().into(), self.matrix.column(k).to_vec()));
        }
        DataFrame::new(columns)
    }

    /// Per-component eigenvalue, explained and cumulative variance ratio.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn variance_frame(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new("component".into(), self.components.clone()),
            Column::new("eigenvalue".into(), self.eigenvalues.to_vec()),
            Column::new("explained_variance_ratio".into(), self.ratios.to_vec()),
            Column::new("cumulative_variance_ratio".into(), self.cumulative.to_vec()),
        ])
    }
}
