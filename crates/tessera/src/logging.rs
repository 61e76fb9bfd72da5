//! JSON log output for production deployments.
//!
//! Every Tessera crate reports through `tracing` (`editor.reduce`,
//! `document.*`, `session.*`, `lesson.*` events). This module installs a
//! global subscriber that writes them as one JSON object per line.

use tracing_subscriber::EnvFilter;

/// Install a JSON subscriber as the global default.
///
/// `RUST_LOG` takes precedence over `default_filter` (for example
/// `"tessera_editor=debug,info"`). Fails if a global subscriber is already
/// set or the filter does not parse.
pub fn init(default_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
}
