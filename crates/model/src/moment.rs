//! Second-moment matrix of a return panel.

use ndarray::{Array1, Array2};
use pcarisk_data::ReturnPanel;
use pcarisk_math::{correlation_matrix, covariance_matrix, demean_columns};
use pcarisk_primitives::Ticker;

use crate::{EigenDecomposition, ModelError};

/// Which second-moment matrix to decompose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatrixKind {
    /// Sample covariance: high-variance assets dominate the leading components.
    Covariance,
    /// Sample correlation: every asset enters with unit variance.
    #[default]
    Correlation,
}

impl MatrixKind {
    /// Covariance when `use_covariance`, correlation otherwise.
    #[must_use]
    pub const fn from_flag(use_covariance: bool) -> Self {
        if use_covariance { Self::Covariance } else { Self::Correlation }
    }
}

/// Covariance or correlation matrix of demeaned returns.
#[derive(Debug, Clone)]
pub struct SecondMoment {
    kind: MatrixKind,
    tickers: Vec<Ticker>,
    matrix: Array2<f64>,
    means: Array1<f64>,
}

impl SecondMoment {
    /// Demean each column by its full-sample mean and build the matrix.
    ///
    /// # Errors
    /// Returns error for fewer than two tickers or rows, or non-finite returns.
    pub fn estimate(returns: &ReturnPanel, kind: MatrixKind) -> Result<Self, ModelError> {
        if returns.n_tickers() < 2 {
            return Err(ModelError::InsufficientAssets {
                requested: 2,
                available: returns.n_tickers(),
            });
        }
        if returns.n_rows() < 2 {
            return Err(ModelError::InsufficientData(format!(
                "second moments need two rows, got {}",
                returns.n_rows()
            )));
        }

        let (demeaned, means) = demean_columns(returns.values())?;
        let matrix = match kind {
            MatrixKind::Covariance => covariance_matrix(&demeaned)?,
            MatrixKind::Correlation => correlation_matrix(&demeaned)?,
        };

        Ok(Self { kind, tickers: returns.tickers().to_vec(), matrix, means })
    }

    /// Matrix kind.
    #[must_use]
    pub const fn kind(&self) -> MatrixKind {
        self.kind
    }

    /// Row and column labels.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// The symmetric (assets × assets) matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Column means removed before estimation.
    #[must_use]
    pub const fn means(&self) -> &Array1<f64> {
        &self.means
    }

    /// Eigen-decompose the matrix.
    ///
    /// # Errors
    /// Returns error if the eigensolver fails.
    pub fn decompose(&self) -> Result<EigenDecomposition, ModelError> {
        EigenDecomposition::from_moment(self)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use pcarisk_data::Frequency;
    use pcarisk_primitives::Date;

    use super::*;

    fn panel(values: Array2<f64>) -> ReturnPanel {
        let start = Date::from_ymd_opt(2024, 1, 2).unwrap();
        let dates = start.iter_days().take(values.nrows()).collect();
        let tickers = (0..values.ncols()).map(|j| Ticker::new(format!("T{j}.DE"))).collect();
        ReturnPanel::new(Frequency::Daily, dates, tickers, values).unwrap()
    }

    #[test]
    fn correlation_has_unit_diagonal() {
        let returns = panel(array![[0.01, 0.02], [0.02, 0.01], [-0.01, 0.0], [0.0, -0.02]]);
        let moment = SecondMoment::estimate(&returns, MatrixKind::Correlation).unwrap();

        assert_relative_eq!(moment.matrix()[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(moment.matrix()[[1, 1]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(moment.means()[0], 0.005, epsilon = 1e-12);
    }

    #[test]
    fn zero_variance_ticker_has_zero_row() {
        let returns = panel(array![[0.01, 0.0], [0.02, 0.0], [-0.01, 0.0]]);
        let moment = SecondMoment::estimate(&returns, MatrixKind::Correlation).unwrap();

        assert_eq!(moment.matrix()[[1, 1]], 0.0);
        assert_eq!(moment.matrix()[[0, 1]], 0.0);
    }

    #[test]
    fn single_ticker_is_rejected() {
        let returns = panel(array![[0.01], [0.02]]);
        assert!(matches!(
            SecondMoment::estimate(&returns, MatrixKind::Covariance),
            Err(ModelError::InsufficientAssets { .. })
        ));
    }

    #[test]
    fn kind_from_flag() {
        assert_eq!(MatrixKind::from_flag(true), MatrixKind::Covariance);
        assert_eq!(MatrixKind::from_flag(false), MatrixKind::Correlation);
    }
}
