#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod yahoo;
pub use yahoo::{YahooProvider, bars_from_quotes, company_from_summary};

mod wikipedia;
pub use wikipedia::{WikipediaListing, extract_column};

mod error;
pub use error::SourceError;

/// User agent sent with every HTTP request.
pub const USER_AGENT: &str = concat!("pcarisk/", env!("CARGO_PKG_VERSION"));
