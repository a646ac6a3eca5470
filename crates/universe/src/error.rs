//! Error types for universe resolution.

use pcarisk_traits::StoreError;

/// Errors that can occur while resolving a universe.
#[derive(Debug, thiserror::Error)]
pub enum UniverseError {
    /// The index name is not in the catalog.
    #[error("unknown universe: {0}")]
    InvalidUniverse(String),

    /// The listing could not be turned into a ticker set.
    #[error("could not resolve {index}: {reason}")]
    ResolutionFailure {
        /// Canonical index name.
        index: String,
        /// What went wrong.
        reason: String,
    },

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UniverseError {
    /// Returns whether retrying later may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ResolutionFailure { .. })
    }

    pub(crate) fn failure(index: &str, reason: impl ToString) -> Self {
        Self::ResolutionFailure { index: index.to_string(), reason: reason.to_string() }
    }
}
