#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[doc(inline)]
pub use pcarisk_data as data;
#[doc(inline)]
pub use pcarisk_math as math;
#[doc(inline)]
pub use pcarisk_model as model;
#[doc(inline)]
pub use pcarisk_primitives as primitives;
#[cfg(feature = "sources")]
#[doc(inline)]
pub use pcarisk_sources as sources;
#[cfg(feature = "store")]
#[doc(inline)]
pub use pcarisk_store as store;
#[doc(inline)]
pub use pcarisk_traits as traits;
#[doc(inline)]
pub use pcarisk_universe as universe;

mod config;
pub use config::{DEFAULT_PALETTE, PipelineConfig};

mod error;
pub use error::PipelineError;

mod pipeline;
pub use pipeline::Pipeline;

mod ingest;
pub use ingest::IngestReport;

mod telemetry;
pub use telemetry::init_tracing;
