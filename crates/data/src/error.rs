//! Error types for data loading and reshaping.

use pcarisk_primitives::{Date, ParseFieldError, Ticker};
use pcarisk_traits::StoreError;

/// Errors that can occur while loading or reshaping panels.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The panel is empty or too small for the requested operation.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Unknown or empty price field list.
    #[error(transparent)]
    InvalidField(#[from] ParseFieldError),

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two observations for the same cell.
    #[error("duplicate observation for {ticker} on {date}")]
    DuplicateCell {
        /// Date of the clash.
        date: Date,
        /// Ticker of the clash.
        ticker: Ticker,
    },

    /// Panel dimensions do not agree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DataError {
    /// Shorthand for [`DataError::InsufficientData`].
    pub(crate) fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DataError::DuplicateCell {
            date: Date::from_ymd_opt(2024, 1, 2).unwrap(),
            ticker: Ticker::new("SAP.DE"),
        };
        assert_eq!(err.to_string(), "duplicate observation for SAP.DE on 2024-01-02");

        let err: DataError = ParseFieldError::Unknown("vwap".to_string()).into();
        assert_eq!(err.to_string(), "unknown price field: vwap");
    }
}
