//! Sorted, sign-normalised eigenpairs.

use ndarray::{Array1, Array2, ArrayViewMut1, Axis, s};
use pcarisk_math::symmetric_eigen;
use pcarisk_primitives::Ticker;
use tracing::debug;

use crate::{Loadings, MatrixKind, ModelError, SecondMoment};

/// Eigenpairs of a second-moment matrix, largest eigenvalue first.
///
/// Each eigenvector's largest-magnitude entry is positive.
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    kind: MatrixKind,
    tickers: Vec<Ticker>,
    eigenvalues: Array1<f64>,
    eigenvectors: Array2<f64>,
}

impl EigenDecomposition {
    /// Decompose a second-moment matrix.
    ///
    /// # Errors
    /// Returns error if the eigensolver fails.
    pub fn from_moment(moment: &SecondMoment) -> Result<Self, ModelError> {
        let eig = symmetric_eigen(moment.matrix())?;
        debug!(assets = moment.tickers().len(), sweeps = eig.sweeps, "eigensolver converged");

        // `sort_by` is stable, so tied eigenvalues keep solver order.
        let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

        let eigenvalues: Array1<f64> = order.iter().map(|&i| eig.eigenvalues[i]).collect();
        let mut eigenvectors = eig.eigenvectors.select(Axis(1), &order);
        for column in eigenvectors.columns_mut() {
            orient(column);
        }

        Ok(Self { kind: moment.kind(), tickers: moment.tickers().to_vec(), eigenvalues, eigenvectors })
    }

    /// Matrix kind that was decomposed.
    #[must_use]
    pub const fn kind(&self) -> MatrixKind {
        self.kind
    }

    /// Asset labels of the eigenvector rows.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Eigenvalues in descending order.
    #[must_use]
    pub const fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Eigenvectors as columns, matching [`Self::eigenvalues`].
    #[must_use]
    pub const fn eigenvectors(&self) -> &Array2<f64> {
        &self.eigenvectors
    }

    /// Share of the total variance carried by each eigenvalue.
    ///
    /// The denominator is the sum of the full spectrum.
    #[must_use]
    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        let total = self.eigenvalues.sum();
        if total <= 0.0 {
            return Array1::zeros(self.eigenvalues.len());
        }
        &self.eigenvalues / total
    }

    /// Running sum of [`Self::explained_variance_ratio`].
    #[must_use]
    pub fn cumulative_variance_ratio(&self) -> Array1<f64> {
        let mut ratios = self.explained_variance_ratio();
        ratios.accumulate_axis_inplace(Axis(0), |&prev, cur| *cur += prev);
        ratios
    }

    /// Keep the first `n_components` eigenpairs as loadings `PC1..PCn`.
    ///
    /// # Errors
    /// Returns error if `n_components` is zero or exceeds the asset count.
    pub fn loadings(&self, n_components: usize) -> Result<Loadings, ModelError> {
        if n_components == 0 {
            return Err(ModelError::InsufficientData("no component requested".to_string()));
        }
        if n_components > self.tickers.len() {
            return Err(ModelError::InsufficientAssets {
                requested: n_components,
                available: self.tickers.len(),
            });
        }

        Ok(Loadings::new(
            self.kind,
            self.tickers.clone(),
            self.eigenvectors.slice(s![.., ..n_components]).to_owned(),
            self.eigenvalues.slice(s![..n_components]).to_owned(),
            self.explained_variance_ratio().slice(s![..n_components]).to_owned(),
            self.cumulative_variance_ratio().slice(s![..n_components]).to_owned(),
        ))
    }
}

/// Flip a vector so its largest-magnitude entry is positive.
fn orient(mut column: ArrayViewMut1<'_, f64>) {
    let pivot = column
        .iter()
        .copied()
        .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        column.mapv_inplace(|x| -x);
    }
}
