//! Subscriber setup
//!
//! The category filter comes from the config file; `RUST_LOG` overrides it.
//! Logs go to stderr; stdout carries command output only.

use routewatch_session_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter_directives()))
}

/// Install the global subscriber. Call once, before any backend is built.
pub fn init(config: &LoggingConfig) {
    // Enhanced logging for debug builds
    #[cfg(debug_assertions)]
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter(config))
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!(target: routewatch_session_core::CONSOLE_TARGET, "Debug mode logging enabled");
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter(config))
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}
