#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod catalog;
pub use catalog::{
    ColumnKind, DEFAULT_LISTING_BASE_URL, IndexCatalog, IndexSpec, ListingPage, normalize_index_name,
};

mod names;
pub use names::strip_corporate_suffix;

mod resolver;
pub use resolver::UniverseResolver;

mod error;
pub use error::UniverseError;
