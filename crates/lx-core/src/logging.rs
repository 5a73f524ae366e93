//! Logging setup
//!
//! `RUST_LOG` wins over the configured filter so a session can be traced
//! without editing the config file.

use crate::config::DebugConfig;
use tracing_subscriber::EnvFilter;

/// Build the filter for a debug configuration
pub fn filter_for(debug: &DebugConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = debug
            .log_filter
            .as_deref()
            .unwrap_or_else(|| debug.log_level.as_directive());
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init(debug: &DebugConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(debug))
        .with_target(true)
        .try_init()
        .is_ok()
}
