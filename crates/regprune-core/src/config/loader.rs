//! Layered configuration loading
//!
//! Values are resolved with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Config file (`--config <path>` or ~/.regprune/config.yaml)
//! 3. Environment variables (DEPOT_TOKEN, REGPRUNE_* prefix)
//! 4. CLI flags (passed in as `ConfigOverrides`)

use crate::error::{Error, Result};
use crate::types::{ExclusionList, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

/// Directory under $HOME holding the default config file
pub const CONFIG_DIR_NAME: &str = ".regprune";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default Depot API endpoint
pub const DEFAULT_API_URL: &str = "https://api.depot.dev";

/// Environment variable holding the bearer token
pub const TOKEN_ENV: &str = "DEPOT_TOKEN";

/// Tags protected when no exclusion list is configured
pub const DEFAULT_EXCLUSIONS: &[&str] = &["latest", "stable", "production"];

/// Upper bound the listing API accepts for a page
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Longest accepted retention period, 100 years
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Resolved regprune configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PruneConfig {
    /// Base URL of the registry API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token; normally supplied through DEPOT_TOKEN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            retention: RetentionConfig::default(),
            fetch: FetchConfig::default(),
            retry: RetryPolicy::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Age cutoff and exclusion policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetentionConfig {
    /// Images pushed this many days ago or earlier are eligible for deletion
    #[serde(default = "default_days")]
    pub days: i64,

    /// `tagName` or `projectId:tagName` entries never deleted
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<String>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            exclusions: default_exclusions(),
        }
    }
}

/// Listing behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Items requested per listing call
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Stop listing a project's images after this many
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_images: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_images: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_days() -> i64 {
    30
}
fn default_exclusions() -> Vec<String> {
    DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
}
fn default_page_size() -> u32 {
    100
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub days: Option<i64>,
    /// Rules appended to the configured exclusions
    pub exclude: Vec<String>,
    /// Drop configured exclusions and use only `exclude`
    pub no_default_exclusions: bool,
    pub page_size: Option<u32>,
    pub max_images: Option<usize>,
}

impl PruneConfig {
    /// Apply command-line overrides on top of the loaded values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.api_url {
            self.api_url = url;
        }
        if let Some(days) = overrides.days {
            self.retention.days = days;
        }
        if overrides.no_default_exclusions {
            self.retention.exclusions.clear();
        }
        for rule in overrides.exclude {
            if !self.retention.exclusions.contains(&rule) {
                self.retention.exclusions.push(rule);
            }
        }
        if let Some(size) = overrides.page_size {
            self.fetch.page_size = size;
        }
        if overrides.max_images.is_some() {
            self.fetch.max_images = overrides.max_images;
        }
    }

    /// Check every value that can be checked without network access
    pub fn validate(&self) -> Result<()> {
        if self.retention.days < 0 {
            return Err(Error::invalid_config(format!(
                "retention days must be a non-negative number, got {}",
                self.retention.days
            )));
        }
        if self.retention.days > MAX_RETENTION_DAYS {
            return Err(Error::invalid_config(format!(
                "retention days must be at most {}, got {}",
                MAX_RETENTION_DAYS, self.retention.days
            )));
        }
        if self.fetch.page_size == 0 || self.fetch.page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid_config(format!(
                "fetch page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.fetch.page_size
            )));
        }
        if self.fetch.max_images == Some(0) {
            return Err(Error::invalid_config("fetch max images must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_config("retry max attempts must be at least 1"));
        }
        if self.api_url.trim().is_empty() {
            return Err(Error::missing_field("api-url"));
        }
        self.exclusion_list()?;
        Ok(())
    }

    /// Parsed exclusion rules
    pub fn exclusion_list(&self) -> Result<ExclusionList> {
        ExclusionList::parse(&self.retention.exclusions)
    }

    /// The bearer token, required by any command that talks to the API
    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(Error::missing_field(format!(
                "token (set {} or 'token' in the config file)",
                TOKEN_ENV
            ))),
        }
    }

    /// Copy of the config safe to print
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.token.is_some() {
            copy.token = Some("********".to_string());
        }
        copy
    }

    /// Cutoff in days, for callers that already validated
    pub fn retention_days(&self) -> u32 {
        self.retention.days.clamp(0, u32::MAX as i64) as u32
    }
}

/// Loads `PruneConfig` from file and environment
pub struct ConfigLoader {
    /// Directory searched for the default config file
    config_dir: Option<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a loader rooted at ~/.regprune
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .map(|home| home.join(CONFIG_DIR_NAME));
        Self { config_dir }
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self {
            config_dir: Some(config_dir),
        }
    }

    /// Path of the default config file, if a home directory is known
    pub fn default_path(&self) -> Option<Utf8PathBuf> {
        self.config_dir.as_ref().map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Load the config file and apply environment overrides
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(&self, path: Option<&Utf8Path>) -> Result<PruneConfig> {
        let config = self.load_file(path)?;
        apply_env_overrides(config, |key| std::env::var(key).ok())
    }

    /// Load only the file layer
    pub fn load_file(&self, path: Option<&Utf8Path>) -> Result<PruneConfig> {
        match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.as_str())
                    } else {
                        Error::Io(e)
                    }
                })?;
                debug!("Loaded config from {}", p);
                parse_config(&content)
            }
            None => match self.default_path() {
                Some(p) if p.exists() => {
                    let content = fs::read_to_string(&p)?;
                    debug!("Loaded config from {}", p);
                    parse_config(&content)
                }
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(PruneConfig::default())
                }
            },
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_config(content: &str) -> Result<PruneConfig> {
    if content.trim().is_empty() {
        return Ok(PruneConfig::default());
    }
    Ok(serde_yaml_ng::from_str(content)?)
}

/// Apply DEPOT_TOKEN and REGPRUNE_* variables using the given lookup
pub fn apply_env_overrides<F>(mut config: PruneConfig, lookup: F) -> Result<PruneConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
        config.token = Some(token);
    }

    if let Some(url) = lookup("REGPRUNE_API_URL").filter(|u| !u.is_empty()) {
        config.api_url = url;
    }

    if let Some(days) = lookup("REGPRUNE_DAYS") {
        config.retention.days = days.trim().parse().map_err(|_| {
            Error::invalid_config(format!("REGPRUNE_DAYS must be an integer, got '{}'", days))
        })?;
    }

    if let Some(list) = lookup("REGPRUNE_EXCLUDE") {
        config.retention.exclusions = list
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
    }

    if let Some(size) = lookup("REGPRUNE_PAGE_SIZE") {
        config.fetch.page_size = size.trim().parse().map_err(|_| {
            Error::invalid_config(format!(
                "REGPRUNE_PAGE_SIZE must be a positive integer, got '{}'",
                size
            ))
        })?;
    }

    Ok(config)
}
