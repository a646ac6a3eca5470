//! Error types for mathematical operations.

/// Errors that can occur during mathematical operations.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Linear algebra error.
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,

    /// Not enough observations for the estimator.
    #[error("need at least {required} observations, got {actual}")]
    TooFewObservations {
        /// Minimum number of rows.
        required: usize,
        /// Rows provided.
        actual: usize,
    },

    /// Numerical instability (NaN or Inf).
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// Iterative solver did not converge.
    #[error("eigensolver did not converge after {sweeps} sweeps")]
    NoConvergence {
        /// Sweeps performed.
        sweeps: usize,
    },
}
