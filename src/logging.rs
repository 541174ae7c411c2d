//! Log subscriber setup.
//!
//! lamina itself only emits `tracing` events. Call [`init`] once at cold
//! start if the binary has no subscriber of its own.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LogConfig;

/// Installs a global fmt subscriber. `RUST_LOG`, when set, overrides
/// `config.level`. Fails if the level is not a valid filter or a global
/// subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let timed = config.timestamps.then(|| fmt::layer().with_ansi(config.ansi));
    let untimed = (!config.timestamps).then(|| fmt::layer().with_ansi(config.ansi).without_time());

    tracing_subscriber::registry()
        .with(filter)
        .with(timed)
        .with(untimed)
        .try_init()?;
    Ok(())
}
