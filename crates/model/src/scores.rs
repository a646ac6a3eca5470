//! Factor score time series.

use ndarray::{Array2, ArrayView1};
use pcarisk_data::Frequency;
use pcarisk_primitives::Date;
use polars::prelude::{Column, DataFrame, PolarsResult};

use crate::ModelError;

/// Returns projected onto the retained components: (dates × components).
#[derive(Debug, Clone)]
pub struct FactorScores {
    frequency: Frequency,
    dates: Vec<Date>,
    components: Vec<String>,
    values: Array2<f64>,
}

impl FactorScores {
    pub(crate) fn new(
        frequency: Frequency,
        dates: Vec<Date>,
        components: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self, ModelError> {
        if values.dim() != (dates.len(), components.len()) {
            return Err(ModelError::DimensionMismatch(format!(
                "scores are {:?}, index has {} dates and {} components",
                values.dim(),
                dates.len(),
                components.len()
            )));
        }
        Ok(Self { frequency, dates, components, values })
    }

    /// Frequency of the projected returns.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Row index.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column labels.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Score values.
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Series of one component by label.
    #[must_use]
    pub fn series(&self, component: &str) -> Option<ArrayView1<'_, f64>> {
        self.components.iter().position(|c| c == component).map(|k| self.values.column(k))
    }

    /// Frame with a `date` column and one column per component.
    ///
    /// # Errors
    /// Returns error if polars rejects the columns.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns = vec![Column::new("date".into(), self.dates.clone())];
        for (k, name) in self.components.iter().enumerate() {
            columns.push(Column::new(name.as_str().into(), self.values.column(k).to_vec()));
        }
        DataFrame::new(columns)
    }
}
