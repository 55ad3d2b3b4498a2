//! Logging configuration using tracing.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ImsError, ImsResult};

/// Environment variable holding a filter directive, e.g. `IMS_LOG=ims=debug`
pub const LOG_ENV: &str = "IMS_LOG";

/// Default filter directive for the given verbosity
pub fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Initialize logging to stderr
///
/// `IMS_LOG` overrides the level chosen from `verbose`.
pub fn init(verbose: bool) -> ImsResult<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| ImsError::Config(format!("Failed to initialize logging: {}", e)))
}
