// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Route `tracing` output to the test harness. `RUST_LOG` overrides the
/// default `debug` filter.
pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    // Ignore the error when another test already installed a subscriber.
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
