#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod moment;
pub use moment::{MatrixKind, SecondMoment};

mod decomposition;
pub use decomposition::EigenDecomposition;

mod loadings;
pub use loadings::Loadings;

mod sector;
pub use sector::{LongLoading, LongLoadings, SectorLoadings};

mod scores;
pub use scores::FactorScores;

mod pca;
pub use pca::{PcaConfig, PcaEstimator, fit};

mod risk_return;
pub use risk_return::{RiskReturnRow, RiskReturnTable, risk_return_table};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use super::{Loadings, ModelError, PcaConfig, PcaEstimator, SectorLoadings};
}
