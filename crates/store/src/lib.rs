#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pcarisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

// Linked for its bundled SQLite build.
use libsqlite3_sys as _;

mod schema;

mod memory;
pub use memory::MemoryStore;

mod sqlite;
pub use sqlite::{MIGRATIONS, SqliteStore};
