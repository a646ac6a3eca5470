#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod ticker;
pub use ticker::Ticker;

mod bar;
pub use bar::{BarRow, ParseFieldError, PriceBar, PriceField};

mod company;
pub use company::CompanyRecord;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;

/// Date format used for persisted and configured dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
