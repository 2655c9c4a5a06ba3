//! Log output via `tracing`.
//!
//! Spans and events are printed to the console through
//! `tracing_subscriber::fmt`; the filter comes from `RUST_LOG` and
//! defaults to `info`. Worker activity logs at `debug`/`trace`, so a
//! quiet production deployment stays quiet by default.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .init();
}
