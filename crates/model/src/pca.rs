//! PCA estimator.

use pcarisk_data::ReturnPanel;
use tracing::debug;

use crate::{Loadings, MatrixKind, ModelError, SecondMoment};

/// Configuration for a PCA fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcaConfig {
    /// Decompose the covariance matrix instead of the correlation matrix.
    pub use_covariance: bool,
    /// Components to retain.
    pub n_components: usize,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self { use_covariance: false, n_components: 10 }
    }
}

/// Fits principal component loadings to a return panel.
#[derive(Debug, Clone, Default)]
pub struct PcaEstimator {
    config: PcaConfig,
}

impl PcaEstimator {
    /// Create a new estimator with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new estimator with custom configuration.
    #[must_use]
    pub const fn with_config(config: PcaConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &PcaConfig {
        &self.config
    }

    /// Demean, build the second-moment matrix, decompose and keep the leading
    /// components.
    ///
    /// # Errors
    /// Returns `InsufficientAssets` for fewer than two tickers or more
    /// components than tickers, and `InsufficientData` for zero components or
    /// fewer than two rows.
    pub fn fit(&self, returns: &ReturnPanel) -> Result<Loadings, ModelError> {
        let PcaConfig { use_covariance, n_components } = self.config;
        if n_components == 0 {
            return Err(ModelError::InsufficientData("no component requested".to_string()));
        }
        let available = returns.n_tickers();
        if available < 2 || n_components > available {
            return Err(ModelError::InsufficientAssets { requested: n_components, available });
        }

        let kind = MatrixKind::from_flag(use_covariance);
        let moment = SecondMoment::estimate(returns, kind)?;
        let decomposition = moment.decompose()?;
        let loadings = decomposition.loadings(n_components)?;

        debug!(
            ?kind,
            assets = available,
            rows = returns.n_rows(),
            components = n_components,
            explained = loadings.cumulative_variance_ratio()[n_components - 1],
            "fitted pca"
        );
        Ok(loadings)
    }
}

/// Fit `n_components` principal components to `returns`.
///
/// # Errors
/// See [`PcaEstimator::fit`].
pub fn fit(
    returns: &ReturnPanel,
    use_covariance: bool,
    n_components: usize,
) -> Result<Loadings, ModelError> {
    PcaEstimator::with_config(PcaConfig { use_covariance, n_components }).fit(returns)
}
