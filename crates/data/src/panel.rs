//! Long and wide panel layouts.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array2, ArrayView1, Axis, s};
use pcarisk_primitives::{BarRow, Date, PriceField, Ticker};
use polars::prelude::{Column, DataFrame, PolarsResult};

use crate::DataError;

/// A long-format row: one (date, ticker) with one value per panel field.
pub type LongRow = BarRow;

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

fn check_grid(dates: &[Date], tickers: &[Ticker], values: &Array2<f64>) -> Result<(), DataError> {
    if values.dim() != (dates.len(), tickers.len()) {
        return Err(DataError::ShapeMismatch(format!(
            "values are {:?}, index has {} dates and {} tickers",
            values.dim(),
            dates.len(),
            tickers.len()
        )));
    }
    if dates.windows(2).any(|w| w[0] >= w[1]) {
        return Err(DataError::InvalidParameter("dates must be strictly increasing".to_string()));
    }
    if tickers.iter().collect::<BTreeSet<_>>().len() != tickers.len() {
        return Err(DataError::InvalidParameter("tickers must be unique".to_string()));
    }
    Ok(())
}

fn grid_frame(dates: &[Date], tickers: &[Ticker], values: &Array2<f64>) -> PolarsResult<DataFrame> {
    let mut columns = Vec::with_capacity(tickers.len() + 1);
    columns.push(Column::new("date".into(), dates.to_vec()));
    for (j, ticker) in tickers.iter().enumerate() {
        let column: Vec<Option<f64>> = values.column(j).iter().map(|&v| finite(v)).collect();
        columns.push(Column::new(ticker.as_str().into(), column));
    }
    DataFrame::new(columns)
}

/// Long panel: one row per (date, ticker), one value column per field.
///
/// Rows are kept ordered by date, then ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct LongPanel {
    fields: Vec<PriceField>,
    rows: Vec<LongRow>,
}

impl LongPanel {
    /// Create a long panel, sorting rows chronologically.
    ///
    /// # Errors
    /// Returns error if no field is given or a row's width differs from the field count.
    pub fn new(fields: Vec<PriceField>, mut rows: Vec<LongRow>) -> Result<Self, DataError> {
        if fields.is_empty() {
            return Err(DataError::InvalidParameter("long panel needs at least one field".into()));
        }
        if let Some(row) = rows.iter().find(|r| r.values.len() != fields.len()) {
            return Err(DataError::ShapeMismatch(format!(
                "row for {} on {} has {} values, expected {}",
                row.ticker,
                row.date,
                row.values.len(),
                fields.len()
            )));
        }

        rows.sort_by(|a, b| (a.date, &a.ticker).cmp(&(b.date, &b.ticker)));
        Ok(Self { fields, rows })
    }

    /// Fields carried by every row.
    #[must_use]
    pub fn fields(&self) -> &[PriceField] {
        &self.fields
    }

    /// Rows ordered by date then ticker.
    #[must_use]
    pub fn rows(&self) -> &[LongRow] {
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

    /// Distinct tickers present in the panel.
    #[must_use]
    pub fn tickers(&self) -> BTreeSet<Ticker> {
        self.rows.iter().map(|r| r.ticker.clone()).collect()
    }

    /// Rows of a single ticker, in date order.
    pub fn for_ticker<'a>(&'a self, ticker: &'a Ticker) -> impl Iterator<Item = &'a LongRow> {
        self.rows.iter().filter(move |r| &r.ticker == ticker)
    }

    /// Flatten into (date, ticker, field, value) observations.
    pub fn triples(&self) -> impl Iterator<Item = (Date, &Ticker, PriceField, f64)> + '_ {
        self.rows.iter().flat_map(move |row| {
            self.fields
                .iter()
                .zip(row.values.iter())
                .map(move |(&field, &value)| (row.date, &row.ticker, field, value))
        })
    }

    /// Pivot one field into a wide panel with one column per ticker.
    ///
    /// Columns are ordered by ticker; cells without an observation are `NaN`.
    ///
    /// # Errors
    /// Returns error if the field is not in the panel or a cell is observed twice.
    pub fn pivot(&self, field: PriceField) -> Result<WidePanel, DataError> {
        let idx = self.fields.iter().position(|&f| f == field).ok_or_else(|| {
            DataError::InvalidParameter(format!("field {field} is not in the panel"))
        })?;

        let dates: Vec<Date> =
            self.rows.iter().map(|r| r.date).collect::<BTreeSet<_>>().into_iter().collect();
        let tickers: Vec<Ticker> = self.tickers().into_iter().collect();

        let date_pos: BTreeMap<Date, usize> =
            dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();
        let ticker_pos: BTreeMap<&Ticker, usize> =
            tickers.iter().enumerate().map(|(j, t)| (t, j)).collect();

        let mut values = Array2::from_elem((dates.len(), tickers.len()), f64::NAN);
        let mut seen = Array2::from_elem((dates.len(), tickers.len()), false);
        for row in &self.rows {
            let (i, j) = (date_pos[&row.date], ticker_pos[&row.ticker]);
            if seen[[i, j]] {
                return Err(DataError::DuplicateCell { date: row.date, ticker: row.ticker.clone() });
            }
            seen[[i, j]] = true;
            values[[i, j]] = row.values[idx];
        }

        WidePanel::new(field, dates, tickers, values)
    }

    /// Convert to a polars frame with columns `date`, `ticker` and one per field.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<Date> = self.rows.iter().map(|r| r.date).collect();
        let tickers: Vec<&str> = self.rows.iter().map(|r| r.ticker.as_str()).collect();

        let mut columns = Vec::with_capacity(self.fields.len() + 2);
        columns.push(Column::new("date".into(), dates));
        columns.push(Column::new("ticker".into(), tickers));
        for (k, field) in self.fields.iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| finite(r.values[k])).collect();
            columns.push(Column::new(field.column_name().into(), values));
        }
        DataFrame::new(columns)
    }
}

/// Wide panel of one price field: rows are dates, columns are tickers.
///
/// Missing cells are `NaN` until the panel is preprocessed.
#[derive(Debug, Clone, PartialEq)]
pub struct WidePanel {
    field: PriceField,
    dates: Vec<Date>,
    tickers: Vec<Ticker>,
    values: Array2<f64>,
}

impl WidePanel {
    /// Create a wide panel.
    ///
    /// # Errors
    /// Returns error if the shape disagrees with the index, dates are not
    /// strictly increasing, or tickers repeat.
    pub fn new(
        field: PriceField,
        dates: Vec<Date>,
        tickers: Vec<Ticker>,
        values: Array2<f64>,
    ) -> Result<Self, DataError> {
        check_grid(&dates, &tickers, &values)?;
        Ok(Self { field, dates, tickers, values })
    }

    /// The price field held in the cells.
    #[must_use]
    pub const fn field(&self) -> PriceField {
        self.field
    }

    /// Row index.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column index.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Cell values (dates × tickers).
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of tickers.
    #[must_use]
    pub fn n_tickers(&self) -> usize {
        self.values.ncols()
    }

    /// Check if the panel has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column of one ticker.
    #[must_use]
    pub fn column(&self, ticker: &Ticker) -> Option<ArrayView1<'_, f64>> {
        self.tickers.iter().position(|t| t == ticker).map(|j| self.values.column(j))
    }

    /// Number of missing cells.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    pub(crate) fn select_columns(&self, keep: &[usize]) -> Self {
        Self {
            field: self.field,
            dates: self.dates.clone(),
            tickers: keep.iter().map(|&j| self.tickers[j].clone()).collect(),
            values: self.values.select(Axis(1), keep),
        }
    }

    pub(crate) fn rows_from(&self, first: usize) -> Self {
        Self {
            field: self.field,
            dates: self.dates[first..].to_vec(),
            tickers: self.tickers.clone(),
            values: self.values.slice(s![first.., ..]).to_owned(),
        }
    }

    pub(crate) fn with_values(&self, values: Array2<f64>) -> Self {
        debug_assert_eq!(values.dim(), self.values.dim());
        Self { field: self.field, dates: self.dates.clone(), tickers: self.tickers.clone(), values }
    }

    /// Melt into a long panel holding the observed (non-`NaN`) cells.
    #[must_use]
    pub fn melt(&self) -> LongPanel {
        let mut rows = Vec::with_capacity(self.values.len());
        for (i, &date) in self.dates.iter().enumerate() {
            for (j, ticker) in self.tickers.iter().enumerate() {
                let value = self.values[[i, j]];
                if !value.is_nan() {
                    rows.push(LongRow { date, ticker: ticker.clone(), values: vec![value] });
                }
            }
        }
        LongPanel { fields: vec![self.field], rows }
    }

    /// Convert to a polars frame with a `date` column and one column per ticker.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        grid_frame(&self.dates, &self.tickers, &self.values)
    }
}

/// Result of a panel load: long for multi-field or explicit long requests.
#[derive(Debug, Clone, PartialEq)]
pub enum PricePanel {
    /// Row per (date, ticker).
    Long(LongPanel),
    /// Column per ticker.
    Wide(WidePanel),
}

impl PricePanel {
    /// Whether the panel is in wide form.
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        matches!(self, Self::Wide(_))
    }

    /// Wide form of a single-field panel.
    ///
    /// # Errors
    /// Returns error for long panels carrying more than one field.
    pub fn into_wide(self) -> Result<WidePanel, DataError> {
        match self {
            Self::Wide(wide) => Ok(wide),
            Self::Long(long) if long.fields().len() == 1 => long.pivot(long.fields()[0]),
            Self::Long(_) => Err(DataError::InvalidParameter(
                "a multi-field panel has no wide form".to_string(),
            )),
        }
    }

    /// Long form of the panel.
    #[must_use]
    pub fn into_long(self) -> LongPanel {
        match self {
            Self::Long(long) => long,
            Self::Wide(wide) => wide.melt(),
        }
    }

    /// Convert to a polars frame in the panel's own layout.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        match self {
            Self::Long(long) => long.to_frame(),
            Self::Wide(wide) => wide.to_frame(),
        }
    }
}

/// Sampling frequency of a return panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// One row per trading day.
    Daily,
    /// One row per calendar month, labelled with the month-end date.
    Monthly,
}

/// Wide panel of fractional returns: rows are dates, columns are tickers.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPanel {
    frequency: Frequency,
    dates: Vec<Date>,
    tickers: Vec<Ticker>,
    values: Array2<f64>,
}

impl ReturnPanel {
    /// Create a return panel.
    ///
    /// # Errors
    /// Returns error if the shape disagrees with the index, dates are not
    /// strictly increasing, or tickers repeat.
    pub fn new(
        frequency: Frequency,
        dates: Vec<Date>,
        tickers: Vec<Ticker>,
        values: Array2<f64>,
    ) -> Result<Self, DataError> {
        check_grid(&dates, &tickers, &values)?;
        Ok(Self { frequency, dates, tickers, values })
    }

    /// Sampling frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Row index.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column index.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Return values (dates × tickers).
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of tickers.
    #[must_use]
    pub fn n_tickers(&self) -> usize {
        self.values.ncols()
    }

    /// Check if the panel has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column of one ticker.
    #[must_use]
    pub fn column(&self, ticker: &Ticker) -> Option<ArrayView1<'_, f64>> {
        self.tickers.iter().position(|t| t == ticker).map(|j| self.values.column(j))
    }

    /// Convert to a polars frame with a `date` column and one column per ticker.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        grid_frame(&self.dates, &self.tickers, &self.values)
    }
}
