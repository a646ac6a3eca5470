//! Price bar type definitions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Date, Ticker};

/// A price column that can be requested from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    /// Opening price.
    Open,
    /// Intraday high.
    High,
    /// Intraday low.
    Low,
    /// Closing price.
    Close,
    /// Close adjusted for splits and dividends by the data source.
    AdjClose,
}

impl PriceField {
    /// All selectable fields in storage order.
    pub const ALL: [Self; 5] = [Self::Open, Self::High, Self::Low, Self::Close, Self::AdjClose];

    /// Column name used in stores and data frames.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::AdjClose => "adj_close",
        }
    }

    /// Parse a comma-joined field list such as `"open, high, low, close"`.
    ///
    /// Duplicates are collapsed while keeping first-seen order.
    ///
    /// # Errors
    /// Returns `ParseFieldError` on an unknown name or an empty list.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, ParseFieldError> {
        let mut fields = Vec::new();
        for part in list.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let field: Self = part.parse()?;
            if !fields.contains(&field) {
                fields.push(field);
            }
        }

        if fields.is_empty() {
            return Err(ParseFieldError::Empty);
        }
        Ok(fields)
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for PriceField {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "close" => Ok(Self::Close),
            "adjclose" | "adjustedclose" => Ok(Self::AdjClose),
            _ => Err(ParseFieldError::Unknown(s.trim().to_string())),
        }
    }
}

/// Error returned when a price field list cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFieldError {
    /// Field name is not one of the selectable price fields.
    #[error("unknown price field: {0}")]
    Unknown(String),

    /// No field was requested.
    #[error("empty price field list")]
    Empty,
}

/// Daily OHLCV bar for one ticker.
///
/// Missing prices are represented as `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date.
    pub date: Date,
    /// Instrument.
    pub ticker: Ticker,
    /// Opening price.
    pub open: f64,
    /// Intraday high.
    pub high: f64,
    /// Intraday low.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Adjusted close.
    pub adj_close: f64,
    /// Traded volume.
    pub volume: u64,
}

impl PriceBar {
    /// Value of a single price field.
    #[must_use]
    pub const fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::AdjClose => self.adj_close,
        }
    }

    /// Project the bar onto the requested fields.
    #[must_use]
    pub fn project(&self, fields: &[PriceField]) -> BarRow {
        BarRow {
            date: self.date,
            ticker: self.ticker.clone(),
            values: fields.iter().map(|&f| self.field(f)).collect(),
        }
    }
}

/// A stored bar projected onto a list of fields, as returned by a store query.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    /// Trading date.
    pub date: Date,
    /// Instrument.
    pub ticker: Ticker,
    /// Values in requested field order (`NaN` when missing).
    pub values: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("open", PriceField::Open)]
    #[case(" High", PriceField::High)]
    #[case("adj_close", PriceField::AdjClose)]
    #[case("Adj Close", PriceField::AdjClose)]
    #[case("adjusted-close", PriceField::AdjClose)]
    fn field_from_str(#[case] raw: &str, #[case] expected: PriceField) {
        assert_eq!(raw.parse::<PriceField>().unwrap(), expected);
    }

    #[test]
    fn parse_list_keeps_order_and_dedups() {
        let fields = PriceField::parse_list("open, high, low, close, open").unwrap();
        assert_eq!(
            fields,
            vec![PriceField::Open, PriceField::High, PriceField::Low, PriceField::Close]
        );
    }

    #[test]
    fn parse_list_errors() {
        assert_eq!(PriceField::parse_list(" , "), Err(ParseFieldError::Empty));
        assert!(matches!(PriceField::parse_list("close, vwap"), Err(ParseFieldError::Unknown(f)) if f == "vwap"));
    }

    #[test]
    fn bar_projection() {
        let bar = PriceBar {
            date: Date::from_ymd_opt(2024, 1, 2).unwrap(),
            ticker: Ticker::new("SAP.DE"),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            adj_close: 1.4,
            volume: 100,
        };
        let row = bar.project(&[PriceField::AdjClose, PriceField::Open]);
        assert_eq!(row.values, vec![1.4, 1.0]);
        assert_eq!(row.ticker.as_str(), "SAP.DE");
    }
}
