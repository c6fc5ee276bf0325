//! Tracing setup for binaries and test harnesses.

use tracing_subscriber::EnvFilter;

/// Initialises a global tracing subscriber from `RUST_LOG`.
///
/// Falls back to `info` when the environment variable is unset or invalid.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        // Second call must not panic
    }
}
