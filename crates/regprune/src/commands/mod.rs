//! CLI command implementations

pub mod config;
pub mod projects;
pub mod prune;

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use regprune_core::config::TOKEN_ENV;
use regprune_core::{ConfigLoader, ConfigOverrides, PruneConfig};
use regprune_registry::{DepotClient, RegistryError};
use std::time::Duration;
use tracing::debug;

/// Load file and environment layers, apply CLI overrides, and validate
///
/// Runs before any network call so bad input never reaches the API.
pub(crate) fn resolve_config(
    config_path: Option<&Utf8Path>,
    overrides: ConfigOverrides,
) -> Result<PruneConfig> {
    let mut config = ConfigLoader::new()
        .load(config_path)
        .context("Failed to load configuration")?;
    config.apply_overrides(overrides);
    config.validate().context("Invalid configuration")?;
    debug!(
        api_url = %config.api_url,
        days = config.retention.days,
        exclusions = config.retention.exclusions.len(),
        "Resolved configuration"
    );
    Ok(config)
}

/// Build an API client from a validated config
pub(crate) fn connect(config: &PruneConfig) -> Result<DepotClient> {
    let token = config.require_token()?;
    let client = DepotClient::with_timeout(
        config.api_url.as_str(),
        token,
        Duration::from_secs(config.timeout_secs),
    )
    .context("Failed to create registry client")?
    .with_retry_policy(config.retry.clone());
    Ok(client)
}

/// Wrap a failed project listing, pointing at the token when it was rejected
pub(crate) fn listing_failed(err: RegistryError) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow!(err).context(format!(
            "Failed to list projects: the registry rejected the token (check {})",
            TOKEN_ENV
        ))
    } else {
        anyhow!(err).context("Failed to list projects")
    }
}
