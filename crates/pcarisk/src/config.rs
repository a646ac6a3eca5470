//! Pipeline configuration.

use std::{path::PathBuf, time::Duration};

use chrono::format::{Item, StrftimeItems};
use pcarisk_data::Preprocessor;
use pcarisk_model::PcaConfig;
use pcarisk_primitives::{DATE_FORMAT, Date};
use pcarisk_universe::DEFAULT_LISTING_BASE_URL;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Colours assigned to sectors in charts, in order.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#00429d", "#3e67ae", "#618fbf", "#85b7ce", "#b1dfdb", "#f8c663", "#f3915f", "#e15d57",
    "#c2294b", "#93003a",
];

/// Defaults shared by every pipeline stage.
///
/// Missing keys take their default, so an empty TOML document is a valid
/// configuration.
///
/// ```toml
/// first_date = "2015-01-01"
/// min_coverage = 0.95
/// default_components = 5
/// database_path = "data/markets.sqlite"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Window start when a load does not name one.
    pub first_date: Date,
    /// `chrono` format of dates supplied as text.
    pub date_format: String,
    /// Share of rows a ticker must have observed to survive preprocessing.
    pub min_coverage: f64,
    /// Components retained by [`Pipeline::fit_pca`](crate::Pipeline::fit_pca).
    pub default_components: usize,
    /// Decompose the covariance instead of the correlation matrix.
    pub use_covariance: bool,
    /// Base address of the index listing pages.
    pub listing_base_url: String,
    /// Timeout of each HTTP request.
    pub http_timeout_secs: u64,
    /// Pause between consecutive company metadata requests.
    pub metadata_pause_ms: u64,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Sector colours for presentation.
    pub palette: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            first_date: Date::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            date_format: DATE_FORMAT.to_string(),
            min_coverage: Preprocessor::DEFAULT_MIN_COVERAGE,
            default_components: PcaConfig::default().n_components,
            use_covariance: false,
            listing_base_url: DEFAULT_LISTING_BASE_URL.to_string(),
            http_timeout_secs: 30,
            metadata_pause_ms: 3000,
            database_path: PathBuf::from("instance/pcarisk.sqlite"),
            palette: DEFAULT_PALETTE.iter().map(ToString::to_string).collect(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns `Config` on malformed TOML, unknown keys or invalid values.
    pub fn from_toml_str(source: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns `Config` naming the first offending key.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.min_coverage > 0.0 && self.min_coverage <= 1.0) {
            return Err(PipelineError::Config(format!(
                "min_coverage must be in (0, 1], got {}",
                self.min_coverage
            )));
        }
        if self.default_components == 0 {
            return Err(PipelineError::Config("default_components must be positive".to_string()));
        }
        if self.http_timeout_secs == 0 {
            return Err(PipelineError::Config("http_timeout_secs must be positive".to_string()));
        }
        if self.listing_base_url.trim().is_empty() {
            return Err(PipelineError::Config("listing_base_url is empty".to_string()));
        }
        if self.palette.is_empty() {
            return Err(PipelineError::Config("palette is empty".to_string()));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(PipelineError::Config(format!(
                "date_format {:?} is not a valid format",
                self.date_format
            )));
        }
        let rendered = self.first_date.format(&self.date_format).to_string();
        if Date::parse_from_str(&rendered, &self.date_format).ok() != Some(self.first_date) {
            return Err(PipelineError::Config(format!(
                "date_format {:?} does not round-trip a calendar date",
                self.date_format
            )));
        }
        Ok(())
    }

    /// Parse a date written in [`date_format`](Self::date_format).
    ///
    /// # Errors
    /// Returns `InvalidInput` if the text does not match the format.
    pub fn parse_date(&self, text: &str) -> Result<Date, PipelineError> {
        Date::parse_from_str(text.trim(), &self.date_format).map_err(|e| {
            PipelineError::InvalidInput(format!(
                "date {text:?} does not match {}: {e}",
                self.date_format
            ))
        })
    }

    /// HTTP request timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Pause between metadata requests.
    #[must_use]
    pub const fn metadata_pause(&self) -> Duration {
        Duration::from_millis(self.metadata_pause_ms)
    }

    /// Colour of the `i`-th sector, cycling through the palette.
    #[must_use]
    pub fn sector_colour(&self, i: usize) -> Option<&str> {
        if self.palette.is_empty() {
            return None;
        }
        self.palette.get(i % self.palette.len()).map(String::as_str)
    }

    /// PCA settings derived from the defaults.
    #[must_use]
    pub const fn pca(&self) -> PcaConfig {
        PcaConfig { use_covariance: self.use_covariance, n_components: self.default_components }
    }
}
