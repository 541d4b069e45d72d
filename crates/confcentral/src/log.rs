pub use tracing::{debug, error, info, trace, warn};

use crate::errors::LogError;

const DEFAULT_DIRECTIVES: &str = "info,confcentral_backend=debug,tower_http=debug";

/// Setup the logging system for the application.
/// This function will install the [`color_eyre`] error reporting system
/// and the [`tracing-subscriber`] logging system.
/// When `RUST_LOG` is not set the filter falls back to [`DEFAULT_DIRECTIVES`].
/// If the color_eyre or tracing-subscriber installation fails,
/// an error will be returned.
pub fn setup() -> Result<(), LogError> {
    use tracing_subscriber::EnvFilter;

    // Install color_eyre
    color_eyre::install().map_err(|e: color_eyre::Report| LogError::ColorEyre(e))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // Setup tracing and tracing-subscriber
    tracing_subscriber::fmt::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(LogError::TracingSubscriber)?;

    Ok(())
}
