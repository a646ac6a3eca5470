#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod panel;
pub use panel::{Frequency, LongPanel, LongRow, PricePanel, ReturnPanel, WidePanel};

mod loader;
pub use loader::{TimeSeriesLoader, clamp_end, today};

mod preprocess;
pub use preprocess::{Preprocessor, drop_sparse, forward_fill};

mod returns;
pub use returns::{ReturnEngine, daily_returns, month_end, monthly_returns};

mod error;
pub use error::DataError;
