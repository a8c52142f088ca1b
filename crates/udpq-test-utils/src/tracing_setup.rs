//! Tracing initialisation helpers for tests.
//!
//! The subscriber is installed at most once per process, so
//! [`init_test_tracing`] is safe to call from every test function.

use tracing_subscriber::EnvFilter;

/// Install a subscriber that writes to the test-harness writer and respects
/// `RUST_LOG` (default `info`).
///
/// ```ignore
/// #[tokio::test]
/// async fn my_test() {
///     udpq_test_utils::tracing_setup::init_test_tracing();
///     tracing::info!("visible with --nocapture");
/// }
/// ```
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
