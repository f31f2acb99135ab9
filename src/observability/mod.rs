//! # Observability
//!
//! Structured logging to stderr with `tracing`, and the per-RPC span macro.

pub mod logging;

pub use logging::LogSettings;

use crate::errors::{ProviderError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Output never touches stdout and carries no ANSI colors, since Terraform
/// relays it into its own log.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let filter = EnvFilter::try_new(&settings.filter).map_err(|e| {
        ProviderError::config(format!("Invalid log filter '{}': {}", settings.filter, e))
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    // A subscriber may already be set elsewhere (e.g. integration tests)
    let _ = if settings.json { builder.json().try_init() } else { builder.try_init() };
    Ok(())
}
