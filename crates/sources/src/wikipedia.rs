//! Constituents tables from Wikipedia pages.

use std::time::Duration;

use pcarisk_traits::{ListingError, ListingSource};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{SourceError, USER_AGENT};

/// Collapse whitespace and drop bracketed footnote markers such as `[1]`.
fn clean_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0_usize;
    for c in raw.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
}

/// Texts of `column` in the table with id `table_id` of an HTML document.
///
/// The header row is the first row made only of `th` cells. Empty cells are
/// skipped.
///
/// # Errors
/// Returns `TableNotFound` or `ColumnNotFound` when the page layout drifted.
pub fn extract_column(
    url: &str,
    html: &str,
    table_id: &str,
    column: &str,
) -> Result<Vec<String>, ListingError> {
    let table_missing =
        || ListingError::TableNotFound { url: url.to_string(), table_id: table_id.to_string() };
    let column_missing = || ListingError::ColumnNotFound {
        url: url.to_string(),
        table_id: table_id.to_string(),
        column: column.to_string(),
    };

    let document = Html::parse_document(html);
    let table_selector =
        Selector::parse(&format!("table[id=\"{table_id}\"]")).map_err(|_| table_missing())?;
    let row_selector = Selector::parse("tr").map_err(|_| table_missing())?;
    let table = document.select(&table_selector).next().ok_or_else(table_missing)?;

    let mut rows = table.select(&row_selector);
    let header = rows
        .by_ref()
        .find(|row| {
            let mut cells = cells(*row).peekable();
            cells.peek().is_some() && cells.all(|c| c.value().name() == "th")
        })
        .ok_or_else(column_missing)?;
    let index = cells(header)
        .position(|cell| clean_text(cell).eq_ignore_ascii_case(column))
        .ok_or_else(column_missing)?;

    Ok(rows
        .filter_map(|row| cells(row).nth(index))
        .map(clean_text)
        .filter(|text| !text.is_empty())
        .collect())
}

/// Listing pages fetched over HTTP.
#[derive(Debug, Clone)]
pub struct WikipediaListing {
    client: reqwest::blocking::Client,
}

impl WikipediaListing {
    /// Create a listing source whose requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client =
            reqwest::blocking::Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    fn fetch(&self, url: &str) -> Result<String, ListingError> {
        self.client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .map_err(|e| ListingError::Unreachable { url: url.to_string(), reason: e.to_string() })
    }
}

impl ListingSource for WikipediaListing {
    fn table_column(
        &self,
        url: &str,
        table_id: &str,
        column: &str,
    ) -> Result<Vec<String>, ListingError> {
        let html = self.fetch(url)?;
        let values = extract_column(url, &html, table_id, column)?;
        debug!(url, table_id, column, rows = values.len(), "scraped listing");
        Ok(values)
    }
}
