/// `load_config` module: turns the process environment (optionally primed from a dotenv file)
/// and command-line overrides into the immutable [`GatewayConfig`] used for the whole run.
///
/// This is the only place the CLI reads environment variables. The variable names, defaults and
/// validation rules live in [`swarm_provenance_core::config`]; this module adds dotenv loading
/// and maps flags to [`ConfigOverrides`].
///
/// # Errors
/// Failures surface as `anyhow::Error` wrapping a `ProvenanceError::Configuration`, so the CLI
/// can still pick the configuration exit code.
use anyhow::Result;
use std::path::Path;
use swarm_provenance_core::config::{ConfigOverrides, GatewayConfig};
use swarm_provenance_core::ProvenanceError;
use tracing::{debug, error, info};

/// Loads `env_file` if given, else a `.env` found from the working directory upwards.
/// Variables already present in the process environment are never overwritten.
pub fn load_environment(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => match dotenvy::from_path(path) {
            Ok(()) => {
                info!(env_file = ?path, "Loaded environment file");
                Ok(())
            }
            Err(e) => {
                error!(error = ?e, env_file = ?path, "Failed to load environment file");
                Err(ProvenanceError::Configuration(format!(
                    "Failed to load environment file {}: {e}",
                    path.display()
                ))
                .into())
            }
        },
        None => match dotenvy::dotenv() {
            Ok(path) => {
                info!(env_file = ?path, "Loaded .env file");
                Ok(())
            }
            Err(e) if e.not_found() => {
                debug!("No .env file found, using process environment only");
                Ok(())
            }
            Err(e) => {
                error!(error = ?e, "Failed to parse .env file");
                Err(ProvenanceError::Configuration(format!("Failed to load .env file: {e}")).into())
            }
        },
    }
}

/// Loads the environment, then resolves the gateway configuration with `overrides` applied.
pub fn load_config(env_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<GatewayConfig> {
    load_environment(env_file)?;
    let config = GatewayConfig::from_env(overrides).map_err(|e| {
        error!(error = %e, "Failed to resolve gateway configuration");
        e
    })?;
    Ok(config)
}
