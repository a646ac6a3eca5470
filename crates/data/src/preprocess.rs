//! Missing-data handling for wide price panels.

use tracing::{debug, info};

use crate::{DataError, WidePanel};

/// Keep only tickers with at least `required` observed (non-`NaN`) cells.
#[must_use]
pub fn drop_sparse(panel: &WidePanel, required: usize) -> WidePanel {
    let keep: Vec<usize> = panel
        .values()
        .columns()
        .into_iter()
        .enumerate()
        .filter(|(_, column)| column.iter().filter(|v| !v.is_nan()).count() >= required)
        .map(|(j, _)| j)
        .collect();
    panel.select_columns(&keep)
}

/// Replace each missing cell with the last earlier observation of its ticker.
///
/// Cells before a ticker's first observation stay missing.
#[must_use]
pub fn forward_fill(panel: &WidePanel) -> WidePanel {
    let mut values = panel.values().clone();
    for mut column in values.columns_mut() {
        let mut last = f64::NAN;
        for cell in column.iter_mut() {
            if cell.is_nan() {
                *cell = last;
            } else {
                last = *cell;
            }
        }
    }
    panel.with_values(values)
}

/// Cleans a wide panel into a gap-free one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessor {
    min_coverage: f64,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self { min_coverage: Self::DEFAULT_MIN_COVERAGE }
    }
}

impl Preprocessor {
    /// Share of rows a ticker must have observed to be kept.
    pub const DEFAULT_MIN_COVERAGE: f64 = 0.9;

    /// Create a preprocessor with a custom coverage threshold.
    ///
    /// # Errors
    /// Returns error unless `0 < min_coverage <= 1`.
    pub fn new(min_coverage: f64) -> Result<Self, DataError> {
        if !(min_coverage > 0.0 && min_coverage <= 1.0) {
            return Err(DataError::InvalidParameter(format!(
                "coverage threshold must be in (0, 1], got {min_coverage}"
            )));
        }
        Ok(Self { min_coverage })
    }

    /// Coverage threshold.
    #[must_use]
    pub const fn min_coverage(&self) -> f64 {
        self.min_coverage
    }

    /// Observations a ticker needs out of `rows` to survive.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn required_observations(&self, rows: usize) -> usize {
        (self.min_coverage * rows as f64).floor() as usize
    }

    /// Drop sparse tickers, forward-fill the rest, then trim leading rows that
    /// still hold gaps.
    ///
    /// The result has no missing cells.
    ///
    /// # Errors
    /// Returns `InsufficientData` if no ticker or no row survives.
    pub fn clean(&self, panel: &WidePanel) -> Result<WidePanel, DataError> {
        if panel.is_empty() {
            return Err(DataError::insufficient("cannot clean an empty panel"));
        }

        let required = self.required_observations(panel.n_rows());
        let kept = drop_sparse(panel, required);
        let dropped = panel.n_tickers() - kept.n_tickers();
        if dropped > 0 {
            info!(dropped, required, rows = panel.n_rows(), "dropped sparse tickers");
        }
        if kept.n_tickers() == 0 {
            return Err(DataError::insufficient(format!(
                "no ticker has {required} of {} rows observed",
                panel.n_rows()
            )));
        }

        let filled = forward_fill(&kept);
        let first_complete = filled
            .values()
            .rows()
            .into_iter()
            .position(|row| row.iter().all(|v| !v.is_nan()))
            .ok_or_else(|| DataError::insufficient("no row is complete after forward fill"))?;
        if first_complete > 0 {
            debug!(trimmed = first_complete, "trimmed leading rows without history");
        }

        Ok(filled.rows_from(first_complete))
    }
}
