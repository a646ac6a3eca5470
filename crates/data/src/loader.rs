//! Date-range loading of price panels from a market store.

use std::collections::BTreeSet;

use pcarisk_primitives::{Date, PriceField, Ticker};
use pcarisk_traits::MarketStore;
use tracing::debug;

use crate::{DataError, LongPanel, PricePanel};

/// Current local calendar date.
#[must_use]
pub fn today() -> Date {
    chrono::Local::now().date_naive()
}

/// Resolve the end of a load window: missing or future dates become `today`.
#[must_use]
pub fn clamp_end(end: Option<Date>, today: Date) -> Date {
    end.map_or(today, |end| end.min(today))
}

/// Loads price panels for a ticker set over a date window.
#[derive(Debug)]
pub struct TimeSeriesLoader<'a, S: MarketStore + ?Sized> {
    store: &'a S,
    first_date: Date,
    today: Option<Date>,
}

impl<'a, S: MarketStore + ?Sized> TimeSeriesLoader<'a, S> {
    /// Create a loader. `first_date` is the default window start.
    pub const fn new(store: &'a S, first_date: Date) -> Self {
        Self { store, first_date, today: None }
    }

    /// Pin the date used as "today" when clamping the window end.
    #[must_use]
    pub const fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    /// Load `field_list` (comma separated) for `tickers` between `start` and `end`.
    ///
    /// With `wide` and a single field the panel is pivoted to one column per
    /// ticker; otherwise it stays long.
    ///
    /// # Errors
    /// Returns error on an unknown field, an inverted window, an empty ticker
    /// set, an empty result, or a store failure.
    pub fn load(
        &self,
        tickers: &BTreeSet<Ticker>,
        field_list: &str,
        start: Option<Date>,
        end: Option<Date>,
        wide: bool,
    ) -> Result<PricePanel, DataError> {
        let fields = PriceField::parse_list(field_list)?;
        if tickers.is_empty() {
            return Err(DataError::insufficient("no tickers requested"));
        }

        let start = start.unwrap_or(self.first_date);
        let end = clamp_end(end, self.today.unwrap_or_else(today));
        if start > end {
            return Err(DataError::InvalidParameter(format!(
                "window start {start} is after end {end}"
            )));
        }

        let rows = self.store.query_bars(tickers, start, end, &fields)?;
        debug!(tickers = tickers.len(), rows = rows.len(), %start, %end, "loaded bars");
        if rows.is_empty() {
            return Err(DataError::insufficient(format!(
                "no bars for {} tickers between {start} and {end}",
                tickers.len()
            )));
        }

        let long = LongPanel::new(fields, rows)?;
        if wide && long.fields().len() == 1 {
            let field = long.fields()[0];
            return Ok(PricePanel::Wide(long.pivot(field)?));
        }
        Ok(PricePanel::Long(long))
    }
}
