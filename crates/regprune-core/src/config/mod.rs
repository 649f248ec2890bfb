//! Configuration loading and validation

mod loader;

pub use loader::{
    apply_env_overrides, ConfigLoader, ConfigOverrides, FetchConfig, PruneConfig,
    RetentionConfig, CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_API_URL, DEFAULT_EXCLUSIONS,
    MAX_PAGE_SIZE, MAX_RETENTION_DAYS, TOKEN_ENV,
};
