//! # regprune-core
//!
//! Core library for regprune providing:
//! - Registry inventory types (images, projects, pages)
//! - Exclusion rules in `tagName` / `projectId:tagName` form
//! - Layered configuration loading and validation
//! - Retry execution engine used by the registry transport

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::{ConfigLoader, ConfigOverrides, PruneConfig};
pub use error::{Error, Result};
pub use types::{ExclusionList, ExclusionMatch, ExclusionRule, Image, Page, PageRequest, Project};
