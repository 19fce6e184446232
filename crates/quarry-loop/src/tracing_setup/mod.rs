//! Tracing setup: `fmt` subscriber filtered by `QUARRY_LOG`, optionally JSON.

pub mod events;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use quarry_core::config::ObservabilityConfig;
use quarry_core::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Install the global subscriber. Idempotent.
///
/// `QUARRY_LOG` takes precedence (e.g. `QUARRY_LOG=quarry_stream=debug,info`);
/// otherwise the configured level applies.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);
        if config.json {
            builder
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .init();
        } else {
            builder.init();
        }
    });
}
