//! Test-only tracing wiring, mirroring the donor's `tracing_subscriber`
//! registry setup in `main.rs` at a scale that fits a `cfg(test)` helper
//! rather than a long-lived process: an `EnvFilter` layer plus `fmt::layer()`,
//! installed at most once per test binary.

use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install a `tracing` subscriber for the current test binary so
/// `debug!`/`warn!` call sites in `pipeline`/`waiter`/`middleware::logging`
/// emit visible output under `RUST_LOG`; a no-op on every call after the
/// first within a binary.
pub(crate) fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cloudsign_core=debug"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}
