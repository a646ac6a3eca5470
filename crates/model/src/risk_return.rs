//! Per-ticker mean and volatility of returns.

use std::collections::BTreeMap;

use pcarisk_data::ReturnPanel;
use pcarisk_math::{column_means, column_std};
use pcarisk_primitives::{CompanyRecord, Ticker};
use polars::prelude::{Column, DataFrame, PolarsResult};

use crate::ModelError;

/// Mean return and volatility of one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReturnRow {
    /// Instrument.
    pub ticker: Ticker,
    /// Average return per period.
    pub mean: f64,
    /// Sample standard deviation of returns per period.
    pub vol: f64,
    /// Sector of the instrument.
    pub sector: String,
}

/// Risk/return table over tickers with a known sector.
#[derive(Debug, Clone, Default)]
pub struct RiskReturnTable {
    rows: Vec<RiskReturnRow>,
}

impl RiskReturnTable {
    /// Rows in panel column order.
    #[must_use]
    pub fn rows(&self) -> &[RiskReturnRow] {
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

    /// Frame with columns `ticker`, `mean`, `vol`, `sector`.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let tickers: Vec<&str> = self.rows.iter().map(|r| r.ticker.as_str()).collect();
        let means: Vec<f64> = self.rows.iter().map(|r| r.mean).collect();
        let vols: Vec<f64> = self.rows.iter().map(|r| r.vol).collect();
        let sectors: Vec<&str> = self.rows.iter().map(|r| r.sector.as_str()).collect();
        DataFrame::new(vec![
            Column::new("ticker".into(), tickers),
            Column::new("mean".into(), means),
            Column::new("vol".into(), vols),
            Column::new("sector".into(), sectors),
        ])
    }
}

/// Mean and sample standard deviation of each ticker's returns, inner-joined
/// with the sector of its company record.
///
/// # Errors
/// Returns error for fewer than two rows or non-finite returns.
pub fn risk_return_table(
    returns: &ReturnPanel,
    companies: &[CompanyRecord],
) -> Result<RiskReturnTable, ModelError> {
    if returns.n_rows() < 2 {
        return Err(ModelError::InsufficientData(format!(
            "volatility needs two rows, got {}",
            returns.n_rows()
        )));
    }

    let means = column_means(returns.values())?;
    let vols = column_std(returns.values())?;

    let mut sectors: BTreeMap<&Ticker, &str> = BTreeMap::new();
    for company in companies {
        if let Some(sector) = company.sector.as_deref() {
            sectors.entry(&company.ticker).or_insert(sector);
        }
    }

    let rows = returns
        .tickers()
        .iter()
        .enumerate()
        .filter_map(|(j, ticker)| {
            sectors.get(ticker).map(|sector| RiskReturnRow {
                ticker: ticker.clone(),
                mean: means[j],
                vol: vols[j],
                sector: (*sector).to_string(),
            })
        })
        .collect();

    Ok(RiskReturnTable { rows })
}
