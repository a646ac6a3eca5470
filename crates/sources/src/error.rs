//! Error types for source construction.

/// Errors raised while building a network adapter.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Async runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// Yahoo connector could not be built.
    #[error("yahoo connector error: {0}")]
    Yahoo(String),
}
