//! Log output for soft assertion runs.
//!
//! The crate only emits `tracing` events. Harnesses that want to see them
//! install a subscriber once per process with [`init_tracing`].

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "soft_assert=info";

/// Install a formatted subscriber honoring `RUST_LOG`.
///
/// Output goes through the test writer so `cargo test` captures it per test.
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init()
        .is_ok()
}

/// Install a JSON subscriber for machine-readable CI logs.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_json_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // Another test may have installed the subscriber first
        let _ = init_tracing();
        assert!(!init_tracing());
        assert!(!init_json_tracing());
    }
}
