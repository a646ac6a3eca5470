//! Yahoo Finance market data provider.

use std::{collections::BTreeSet, time::Duration};

use chrono::NaiveTime;
use pcarisk_primitives::{CompanyRecord, Date, PriceBar, Ticker};
use pcarisk_traits::{MarketDataProvider, ProviderError};
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::runtime::Runtime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::{SourceError, USER_AGENT};

const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price,assetProfile,summaryDetail,defaultKeyStatistics";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    result: Option<Vec<SummaryResult>>,
    error: Option<SummaryError>,
}

#[derive(Debug, Deserialize)]
struct SummaryError {
    code: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryResult {
    price: Option<PriceModule>,
    asset_profile: Option<ProfileModule>,
    summary_detail: Option<DetailModule>,
    default_key_statistics: Option<StatsModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    short_name: Option<String>,
    exchange: Option<String>,
    market_cap: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileModule {
    industry: Option<String>,
    sector: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailModule {
    beta: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StatsModule {
    book_value: Option<RawNumber>,
    beta: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNumber {
    raw: Option<f64>,
}

fn raw(value: Option<&RawNumber>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

/// Build a company record from a quote summary response body.
///
/// Attributes missing from the payload are `None`.
///
/// # Errors
/// Returns `Unavailable` if Yahoo reports no result for the ticker and
/// `Decode` if the body is not a quote summary.
pub fn company_from_summary(ticker: &Ticker, body: &str) -> Result<CompanyRecord, ProviderError> {
    let response: SummaryResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
    let envelope = response.quote_summary;
    if let Some(err) = envelope.error {
        debug!(%ticker, code = %err.code, description = %err.description, "quote summary error");
        return Err(ProviderError::Unavailable(ticker.clone()));
    }
    let result = envelope
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::Unavailable(ticker.clone()))?;

    let price = result.price.unwrap_or_default();
    let profile = result.asset_profile.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();

    Ok(CompanyRecord {
        ticker: ticker.clone(),
        name: price.short_name,
        exchange: price.exchange,
        industry: profile.industry,
        sector: profile.sector,
        market_cap: raw(price.market_cap.as_ref()),
        book_value: raw(stats.book_value.as_ref()),
        beta: raw(detail.beta.as_ref()).or_else(|| raw(stats.beta.as_ref())),
        universe: None,
    })
}

/// Convert Yahoo quotes to bars, keeping those dated within `[start, end]`.
#[must_use]
pub fn bars_from_quotes(
    ticker: &Ticker,
    quotes: &[yahoo::Quote],
    start: Date,
    end: Date,
) -> Vec<PriceBar> {
    quotes
        .iter()
        .filter_map(|q| {
            let date = chrono::DateTime::from_timestamp(q.timestamp, 0)?.date_naive();
            (start <= date && date <= end).then(|| PriceBar {
                date,
                ticker: ticker.clone(),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                adj_close: q.adjclose,
                volume: q.volume,
            })
        })
        .collect()
}

fn offset_datetime(date: Date) -> Result<OffsetDateTime, ProviderError> {
    let seconds = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(seconds).map_err(|e| ProviderError::Request(e.to_string()))
}

/// Daily bars, metadata and symbol search from Yahoo Finance.
pub struct YahooProvider {
    runtime: Runtime,
    connector: yahoo::YahooConnector,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for YahooProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooProvider").finish_non_exhaustive()
    }
}

impl YahooProvider {
    /// Create a provider whose metadata requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns error if the runtime, HTTP client or Yahoo connector cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let connector =
            yahoo::YahooConnector::new().map_err(|e| SourceError::Yahoo(e.to_string()))?;
        let client =
            reqwest::blocking::Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
        Ok(Self { runtime, connector, client })
    }

    fn history(&self, ticker: &Ticker, start: Date, end: Date) -> Result<Vec<PriceBar>, ProviderError> {
        let from = offset_datetime(start)?;
        let until = offset_datetime(end.succ_opt().unwrap_or(end))?;
        let response = self
            .runtime
            .block_on(self.connector.get_quote_history(ticker.as_str(), from, until))
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        let quotes = response.quotes().map_err(|_| ProviderError::Unavailable(ticker.clone()))?;
        Ok(bars_from_quotes(ticker, &quotes, start, end))
    }
}

impl MarketDataProvider for YahooProvider {
    fn download_bars(
        &self,
        tickers: &BTreeSet<Ticker>,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        let mut bars = Vec::new();
        let mut failed = 0_usize;
        let mut last_error = None;
        for ticker in tickers {
            match self.history(ticker, start, end) {
                Ok(mut history) => {
                    debug!(%ticker, bars = history.len(), "downloaded history");
                    bars.append(&mut history);
                }
                Err(err) => {
                    warn!(%ticker, error = %err, "skipping ticker without history");
                    failed += 1;
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if failed == tickers.len() => Err(err),
            _ => Ok(bars),
        }
    }

    fn company_info(&self, ticker: &Ticker) -> Result<CompanyRecord, ProviderError> {
        let url = format!("{SUMMARY_URL}/{ticker}");
        let body = self
            .client
            .get(&url)
            .query(&[("modules", SUMMARY_MODULES)])
            .send()
            .and_then(reqwest::blocking::Response::text)
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        company_from_summary(ticker, &body)
    }

    fn search_symbol(&self, query: &str) -> Result<Vec<Ticker>, ProviderError> {
        let result = self
            .runtime
            .block_on(self.connector.search_ticker(query))
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        Ok(result.quotes.into_iter().map(|item| Ticker::new(item.symbol)).collect())
    }
}
