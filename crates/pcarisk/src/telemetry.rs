//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt};

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing initialised");
    }
}
