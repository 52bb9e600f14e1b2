//! Logging initialization.
//!
//! Provides a single initialization point for `tracing` output.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

static INIT_ONCE: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Only the first
/// call has an effect; later calls are ignored.
pub fn init(config: &LoggingConfig) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        // Another subscriber may already be installed (e.g. by a test harness)
        let _ = match config.format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
    });
}
