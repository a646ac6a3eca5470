//! Error types for the factor engine.

use pcarisk_math::MathError;
use pcarisk_primitives::Ticker;

/// Errors that can occur while fitting or applying the factor model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Too few assets for the requested decomposition.
    #[error("insufficient assets: {requested} components need at least that many and two assets, have {available}")]
    InsufficientAssets {
        /// Components requested.
        requested: usize,
        /// Assets available.
        available: usize,
    },

    /// Too few observations, or no component requested.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Dimension mismatch.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A ticker carried by the loadings is absent from the input panel.
    #[error("ticker {0} is missing from the input")]
    MissingTicker(Ticker),
}

impl ModelError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingTicker(_))
    }
}
