//! Ticker type definitions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Exchange-listed ticker symbol.
///
/// Tickers are trimmed and upper-cased on construction so that set operations
/// never see two spellings of the same instrument.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
pub struct Ticker(String);

impl Ticker {
    /// Create a new ticker, normalizing case and surrounding whitespace.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_ascii_uppercase())
    }

    /// Build the canonical form of a raw listing symbol.
    ///
    /// Footnote markers such as `[1]` and inner whitespace are removed, the
    /// symbol is upper-cased, and `.{suffix}` is appended when the symbol does
    /// not already carry an exchange suffix. Returns `None` for blank input.
    #[must_use]
    pub fn canonical(raw: &str, suffix: &str) -> Option<Self> {
        let mut cleaned = String::with_capacity(raw.len() + suffix.len() + 1);
        let mut depth = 0usize;
        for ch in raw.chars() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                c if depth == 0 && !c.is_whitespace() => cleaned.push(c.to_ascii_uppercase()),
                _ => {}
            }
        }

        if cleaned.is_empty() {
            return None;
        }

        let ticker = Self(cleaned);
        if ticker.exchange_suffix().is_some() || suffix.is_empty() {
            Some(ticker)
        } else {
            Some(Self(format!("{}.{}", ticker.0, suffix.trim_start_matches('.').to_ascii_uppercase())))
        }
    }

    /// Get the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The exchange suffix (`DE` in `SAP.DE`), if present.
    #[must_use]
    pub fn exchange_suffix(&self) -> Option<&str> {
        let (root, suffix) = self.0.rsplit_once('.')?;
        let valid = !root.is_empty()
            && (1..=3).contains(&suffix.len())
            && suffix.chars().all(|c| c.is_ascii_alphabetic());
        valid.then_some(suffix)
    }

    /// Whether the ticker carries an exchange suffix.
    #[must_use]
    pub fn has_exchange_suffix(&self) -> bool {
        self.exchange_suffix().is_some()
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn ticker_normalizes_case() {
        let t: Ticker = " sap.de ".into();
        assert_eq!(t.as_str(), "SAP.DE");
        assert_eq!(t, Ticker::new("SAP.DE"));
    }

    #[rstest]
    #[case("ADS", "ADS.DE")]
    #[case("ads", "ADS.DE")]
    #[case("SAP.DE", "SAP.DE")]
    #[case("1COV", "1COV.DE")]
    #[case("BMW[3]", "BMW.DE")]
    #[case(" HEN3 ", "HEN3.DE")]
    fn canonical_appends_suffix(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Ticker::canonical(raw, "DE").unwrap().as_str(), expected);
    }

    #[test]
    fn canonical_rejects_blank() {
        assert!(Ticker::canonical("   ", "DE").is_none());
        assert!(Ticker::canonical("[1]", "DE").is_none());
    }

    #[test]
    fn canonical_keeps_foreign_suffix() {
        let t = Ticker::canonical("ASML.AS", "DE").unwrap();
        assert_eq!(t.as_str(), "ASML.AS");
        assert_eq!(t.exchange_suffix(), Some("AS"));
    }

    #[test]
    fn exchange_suffix_detection() {
        assert!(Ticker::new("SAP.DE").has_exchange_suffix());
        assert!(!Ticker::new("SAP").has_exchange_suffix());
        assert!(!Ticker::new(".DE").has_exchange_suffix());
        assert!(!Ticker::new("ABC.1234").has_exchange_suffix());
    }
}
