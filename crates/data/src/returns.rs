//! Daily and monthly simple returns.

use std::cell::OnceCell;

use chrono::{Datelike, Months};
use ndarray::{Array2, s};
use pcarisk_primitives::Date;

use crate::{DataError, Frequency, ReturnPanel, WidePanel};

/// Last calendar day of the month containing `date`.
#[must_use]
pub fn month_end(date: Date) -> Date {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Lag-one simple returns `p[t] / p[t-1] - 1`.
///
/// The first row has no predecessor and is dropped.
///
/// # Errors
/// Returns `InsufficientData` for panels with fewer than two rows.
pub fn daily_returns(prices: &WidePanel) -> Result<ReturnPanel, DataError> {
    if prices.n_rows() < 2 || prices.n_tickers() == 0 {
        return Err(DataError::insufficient(format!(
            "daily returns need two rows and one ticker, got {:?}",
            prices.values().dim()
        )));
    }

    let values = prices.values();
    let current = values.slice(s![1.., ..]);
    let previous = values.slice(s![..-1, ..]);
    let returns = &current / &previous - 1.0;

    ReturnPanel::new(
        Frequency::Daily,
        prices.dates()[1..].to_vec(),
        prices.tickers().to_vec(),
        returns,
    )
}

/// Compound daily returns within each calendar month: `∏(1 + r) - 1`.
///
/// Missing daily values are skipped. Rows are labelled with the month-end date.
///
/// # Errors
/// Returns error if the input is not daily or is empty.
pub fn monthly_returns(daily: &ReturnPanel) -> Result<ReturnPanel, DataError> {
    if daily.frequency() != Frequency::Daily {
        return Err(DataError::InvalidParameter("monthly returns compound daily returns".into()));
    }
    if daily.is_empty() {
        return Err(DataError::insufficient("no daily returns to compound"));
    }

    let values = daily.values();
    let mut labels = Vec::new();
    let mut growth: Vec<Vec<f64>> = Vec::new();
    for (i, date) in daily.dates().iter().enumerate() {
        let label = month_end(*date);
        if labels.last() != Some(&label) {
            labels.push(label);
            growth.push(vec![1.0; daily.n_tickers()]);
        }
        let Some(month) = growth.last_mut() else { continue };
        for (g, &r) in month.iter_mut().zip(values.row(i)) {
            if !r.is_nan() {
                *g *= 1.0 + r;
            }
        }
    }

    let flat: Vec<f64> = growth.into_iter().flatten().map(|g| g - 1.0).collect();
    let monthly = Array2::from_shape_vec((labels.len(), daily.n_tickers()), flat)
        .map_err(|e| DataError::ShapeMismatch(e.to_string()))?;

    ReturnPanel::new(Frequency::Monthly, labels, daily.tickers().to_vec(), monthly)
}

/// Return views of one cleaned price panel.
///
/// Daily returns are computed on first use and reused afterwards.
#[derive(Debug)]
pub struct ReturnEngine {
    prices: WidePanel,
    daily: OnceCell<ReturnPanel>,
}

impl ReturnEngine {
    /// Wrap a cleaned price panel.
    #[must_use]
    pub const fn new(prices: WidePanel) -> Self {
        Self { prices, daily: OnceCell::new() }
    }

    /// Underlying prices.
    #[must_use]
    pub const fn prices(&self) -> &WidePanel {
        &self.prices
    }

    /// Daily returns, computed at most once.
    ///
    /// # Errors
    /// Returns `InsufficientData` for panels with fewer than two rows.
    pub fn daily(&self) -> Result<&ReturnPanel, DataError> {
        if let Some(daily) = self.daily.get() {
            return Ok(daily);
        }
        let computed = daily_returns(&self.prices)?;
        Ok(self.daily.get_or_init(|| computed))
    }

    /// Monthly returns compounded from the daily ones.
    ///
    /// # Errors
    /// Returns `InsufficientData` for panels with fewer than two rows.
    pub fn monthly(&self) -> Result<ReturnPanel, DataError> {
        monthly_returns(self.daily()?)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use pcarisk_primitives::{PriceField, Ticker};
    use rstest::rstest;

    use super::*;

    fn daily_panel(start: Date, values: Array2<f64>) -> WidePanel {
        let dates = (0..values.nrows()).map(|i| start + chrono::Days::new(i as u64)).collect();
        let tickers = (0..values.ncols()).map(|j| Ticker::new(format!("T{j}.DE"))).collect();
        WidePanel::new(PriceField::AdjClose, dates, tickers, values).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(ymd(2024, 2, 10), ymd(2024, 2, 29))]
    #[case(ymd(2023, 2, 1), ymd(2023, 2, 28))]
    #[case(ymd(2024, 12, 31), ymd(2024, 12, 31))]
    #[case(ymd(2024, 4, 30), ymd(2024, 4, 30))]
    fn month_end_cases(#[case] date: Date, #[case] expected: Date) {
        assert_eq!(month_end(date), expected);
    }

    #[test]
    fn daily_drops_first_row() {
        let prices = daily_panel(ymd(2024, 1, 1), array![[100.0, 50.0], [110.0, 50.0], [99.0, 50.0]]);
        let returns = daily_returns(&prices).unwrap();

        assert_eq!(returns.n_rows(), 2);
        assert_eq!(returns.dates(), &prices.dates()[1..]);
        assert_relative_eq!(returns.values()[[0, 0]], 0.1, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[[1, 0]], -0.1, epsilon = 1e-12);
        assert_eq!(returns.values()[[0, 1]], 0.0);
        assert_eq!(returns.values()[[1, 1]], 0.0);
    }

    #[test]
    fn daily_needs_two_rows() {
        let prices = daily_panel(ymd(2024, 1, 1), array![[100.0]]);
        assert!(matches!(daily_returns(&prices), Err(DataError::InsufficientData(_))));
    }

    #[test]
    fn monthly_compounds_constant_growth() {
        // Jan 1 to Mar 31 2024 inclusive, growing 1% a day.
        let days = 91;
        let prices = Array2::from_shape_fn((days, 1), |(i, _)| 100.0 * 1.01_f64.powi(i as i32));
        let engine = ReturnEngine::new(daily_panel(ymd(2024, 1, 1), prices));

        let monthly = engine.monthly().unwrap();

        assert_eq!(monthly.frequency(), Frequency::Monthly);
        assert_eq!(monthly.dates(), &[ymd(2024, 1, 31), ymd(2024, 2, 29), ymd(2024, 3, 31)]);
        // January loses its first day to the lag.
        for (row, k) in [30, 29, 31].into_iter().enumerate() {
            assert_relative_eq!(monthly.values()[[row, 0]], 1.01_f64.powi(k) - 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn monthly_skips_missing_days() {
        let daily = ReturnPanel::new(
            Frequency::Daily,
            vec![ymd(2024, 5, 2), ymd(2024, 5, 3), ymd(2024, 6, 3)],
            vec![Ticker::new("A.DE")],
            array![[0.1], [f64::NAN], [0.05]],
        )
        .unwrap();
        let monthly = monthly_returns(&daily).unwrap();

        assert_relative_eq!(monthly.values()[[0, 0]], 0.1, epsilon = 1e-12);
        assert_relative_eq!(monthly.values()[[1, 0]], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn monthly_rejects_monthly_input() {
        let monthly = ReturnPanel::new(
            Frequency::Monthly,
            vec![ymd(2024, 5, 31)],
            vec![Ticker::new("A.DE")],
            array![[0.1]],
        )
        .unwrap();
        assert!(monthly_returns(&monthly).is_err());
    }

    #[test]
    fn engine_computes_daily_once() {
        let engine = ReturnEngine::new(daily_panel(ymd(2024, 1, 1), array![[1.0], [2.0], [3.0]]));
        let first = engine.daily().unwrap();
        let second = engine.daily().unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
