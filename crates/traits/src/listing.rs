//! Listing page trait definitions.

/// Errors raised while reading a constituents listing.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// The page could not be fetched.
    #[error("listing {url} unreachable: {reason}")]
    Unreachable {
        /// Page address.
        url: String,
        /// Underlying failure.
        reason: String,
    },

    /// No table with the expected id exists on the page.
    #[error("listing {url} has no table with id {table_id}")]
    TableNotFound {
        /// Page address.
        url: String,
        /// Expected table id.
        table_id: String,
    },

    /// The table exists but lacks the expected column.
    #[error("listing {url} table {table_id} has no column {column}")]
    ColumnNotFound {
        /// Page address.
        url: String,
        /// Table id.
        table_id: String,
        /// Expected column header.
        column: String,
    },
}

/// Source of HTML tables listing index constituents.
pub trait ListingSource: Send + Sync {
    /// Cell texts of `column` in the table with id `table_id` on the page at `url`.
    ///
    /// # Errors
    /// Returns `ListingError` if the page is unreachable or its schema drifted.
    fn table_column(
        &self,
        url: &str,
        table_id: &str,
        column: &str,
    ) -> Result<Vec<String>, ListingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_error_display() {
        let err = ListingError::ColumnNotFound {
            url: "https://example.org/DAX".to_string(),
            table_id: "constituents".to_string(),
            column: "Ticker".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "listing https://example.org/DAX table constituents has no column Ticker"
        );
    }
}
