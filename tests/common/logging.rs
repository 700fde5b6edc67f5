//! Logging for the integration tests.
//!
//! Every test calls [`setup`] first. Only the first call installs the
//! subscriber, the others are no-ops.
use std::sync::Once;

use tracing::level_filters::LevelFilter;

static INIT: Once = Once::new();

/// Sends the log records at or above `filter` to the test output, which
/// `cargo test` shows for failing tests.
pub fn setup(filter: LevelFilter) {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(filter)
            .with_test_writer()
            .compact()
            .init();

        tracing::info!(%filter, "Logging initialized");
    });
}
