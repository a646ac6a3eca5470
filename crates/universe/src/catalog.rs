//! Known index families and their listing pages.

use crate::UniverseError;

/// Default base address of the listing pages.
pub const DEFAULT_LISTING_BASE_URL: &str = "https://en.wikipedia.org/wiki";

/// What a listing column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Exchange symbols, suffixed with the given exchange code when bare.
    Symbol {
        /// Exchange suffix without the dot.
        suffix: &'static str,
    },
    /// Free-text company names resolved through symbol search.
    CompanyName,
}

/// One table column on one listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingPage {
    /// Page path relative to the base address.
    pub page: &'static str,
    /// Id attribute of the constituents table.
    pub table_id: &'static str,
    /// Header of the column to read.
    pub column: &'static str,
    /// Content of the column.
    pub kind: ColumnKind,
}

impl ListingPage {
    /// Full address of the page under `base_url`.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.page)
    }
}

const DAX: ListingPage = ListingPage {
    page: "DAX",
    table_id: "constituents",
    column: "Ticker",
    kind: ColumnKind::Symbol { suffix: "DE" },
};

const MDAX: ListingPage = ListingPage {
    page: "MDAX",
    table_id: "constituents",
    column: "Symbol",
    kind: ColumnKind::Symbol { suffix: "DE" },
};

const SDAX: ListingPage = ListingPage {
    page: "SDAX",
    table_id: "constituents",
    column: "Symbol",
    kind: ColumnKind::Symbol { suffix: "DE" },
};

const EURO_STOXX_50: ListingPage = ListingPage {
    page: "Euro_Stoxx_50",
    table_id: "constituents",
    column: "Name",
    kind: ColumnKind::CompanyName,
};

const INDICES: &[(&str, &[ListingPage])] = &[
    ("DAX", &[DAX]),
    ("MDAX", &[MDAX]),
    ("SDAX", &[SDAX]),
    ("DAX-COMPOSITE", &[DAX, MDAX, SDAX]),
    ("EURO-STOXX-50", &[EURO_STOXX_50]),
];

/// Fold an index name for comparison: upper-cased with `_`, `-` and whitespace removed.
#[must_use]
pub fn normalize_index_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// A resolvable index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    name: &'static str,
    pages: Vec<(String, ListingPage)>,
}

impl IndexSpec {
    /// Canonical index name, also used as the universe tag in the store.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Listing pages with their full addresses.
    #[must_use]
    pub fn pages(&self) -> &[(String, ListingPage)] {
        &self.pages
    }
}

/// Catalog of known indices rooted at a listing base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCatalog {
    base_url: String,
}

impl Default for IndexCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_LISTING_BASE_URL)
    }
}

impl IndexCatalog {
    /// Create a catalog whose pages live under `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// Base address of the listing pages.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Canonical names of all known indices.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        INDICES.iter().map(|(name, _)| *name)
    }

    /// Look up an index by name.
    ///
    /// # Errors
    /// Returns `InvalidUniverse` if no index matches.
    pub fn lookup(&self, index_name: &str) -> Result<IndexSpec, UniverseError> {
        let wanted = normalize_index_name(index_name);
        let &(name, pages) = INDICES
            .iter()
            .find(|(name, _)| !wanted.is_empty() && normalize_index_name(name) == wanted)
            .ok_or_else(|| UniverseError::InvalidUniverse(index_name.to_string()))?;

        Ok(IndexSpec {
            name,
            pages: pages.iter().map(|page| (page.url(&self.base_url), *page)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("DAX", "DAX")]
    #[case("dax", "DAX")]
    #[case("dax_composite", "DAX-COMPOSITE")]
    #[case("Dax Composite", "DAX-COMPOSITE")]
    #[case("EuroStoxx50", "EURO-STOXX-50")]
    #[case("euro-stoxx_50", "EURO-STOXX-50")]
    fn lookup_ignores_case_and_separators(#[case] input: &str, #[case] expected: &str) {
        let spec = IndexCatalog::default().lookup(input).unwrap();
        assert_eq!(spec.name(), expected);
    }

    #[rstest]
    #[case("FTSE")]
    #[case("")]
    #[case("--")]
    fn unknown_index(#[case] input: &str) {
        let err = IndexCatalog::default().lookup(input).unwrap_err();
        assert!(matches!(err, UniverseError::InvalidUniverse(name) if name == input));
    }

    #[test]
    fn composite_unions_three_pages() {
        let catalog = IndexCatalog::new("http://localhost:8080/wiki/");
        let spec = catalog.lookup("DAX-COMPOSITE").unwrap();
        let urls: Vec<&str> = spec.pages().iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:8080/wiki/DAX",
                "http://localhost:8080/wiki/MDAX",
                "http://localhost:8080/wiki/SDAX"
            ]
        );
        assert_eq!(spec.pages()[0].1.column, "Ticker");
        assert_eq!(spec.pages()[1].1.column, "Symbol");
    }

    #[test]
    fn single_member_reads_own_page() {
        let spec = IndexCatalog::default().lookup("DAX").unwrap();
        assert_eq!(spec.pages().len(), 1);
        assert_eq!(spec.pages()[0].0, "https://en.wikipedia.org/wiki/DAX");
    }

    #[test]
    fn regional_index_reads_names() {
        let spec = IndexCatalog::default().lookup("EURO-STOXX-50").unwrap();
        assert_eq!(spec.pages()[0].1.kind, ColumnKind::CompanyName);
        assert_eq!(IndexCatalog::default().names().count(), 5);
    }
}
