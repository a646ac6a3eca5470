#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod store;
pub use store::{MarketStore, StoreError};

mod provider;
pub use provider::{MarketDataProvider, ProviderError};

mod listing;
pub use listing::{ListingError, ListingSource};
