//! Unified pipeline errors.

use pcarisk_data::DataError;
use pcarisk_math::MathError;
use pcarisk_model::ModelError;
use pcarisk_traits::{ProviderError, StoreError};
use pcarisk_universe::UniverseError;

/// Errors surfaced by the [`Pipeline`](crate::Pipeline).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The index name is not known.
    #[error("unknown universe: {0}")]
    InvalidUniverse(String),

    /// The index listing could not be turned into a ticker set.
    #[error("could not resolve {index}: {reason}")]
    ResolutionFailure {
        /// Canonical index name.
        index: String,
        /// What went wrong.
        reason: String,
    },

    /// Not enough observations or tickers for the requested step.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Fewer assets than requested components.
    #[error("insufficient assets: requested {requested} components, have {available} assets")]
    InsufficientAssets {
        /// Components requested.
        requested: usize,
        /// Assets available.
        available: usize,
    },

    /// The store failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The market data provider failed for the whole request.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A caller-supplied argument is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Returns whether retrying later may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ResolutionFailure { .. } | Self::StoreUnavailable(_) | Self::Provider(_))
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<UniverseError> for PipelineError {
    fn from(err: UniverseError) -> Self {
        match err {
            UniverseError::InvalidUniverse(name) => Self::InvalidUniverse(name),
            UniverseError::ResolutionFailure { index, reason } => {
                Self::ResolutionFailure { index, reason }
            }
            UniverseError::Store(err) => err.into(),
        }
    }
}

impl From<DataError> for PipelineError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Store(err) => err.into(),
            DataError::InvalidField(_) | DataError::InvalidParameter(_) => {
                Self::InvalidInput(err.to_string())
            }
            DataError::InsufficientData(msg) => Self::InsufficientData(msg),
            DataError::DuplicateCell { .. } | DataError::ShapeMismatch(_) => {
                Self::InsufficientData(err.to_string())
            }
        }
    }
}

impl From<ModelError> for PipelineError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InsufficientAssets { requested, available } => {
                Self::InsufficientAssets { requested, available }
            }
            ModelError::InsufficientData(msg) => Self::InsufficientData(msg),
            ModelError::Math(MathError::NumericalInstability(msg)) => Self::InsufficientData(msg),
            ModelError::Math(err @ (MathError::EmptyData | MathError::TooFewObservations { .. })) => {
                Self::InsufficientData(err.to_string())
            }
            ModelError::Math(_) | ModelError::DimensionMismatch(_) | ModelError::MissingTicker(_) => {
                Self::InvalidInput(err.to_string())
            }
        }
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
