#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod moments;
pub use moments::{
    ZERO_VARIANCE_EPS, column_means, column_std, correlation_matrix, covariance_matrix,
    demean_columns,
};

mod eigen;
pub use eigen::{SymmetricEigen, symmetric_eigen};

mod error;
pub use error::MathError;
