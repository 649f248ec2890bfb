//! Listing and deletion capabilities consumed by the retention engine

use crate::error::Result;
use async_trait::async_trait;
use regprune_core::types::{Image, Page, PageRequest, Project};

/// A registry that can enumerate projects and images and delete tags
///
/// Implementations own authentication and transport-level retries. Every
/// listing call returns one page; callers drive pagination.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// List one page of the project directory
    async fn list_projects(&self, request: PageRequest) -> Result<Page<Project>>;

    /// List one page of a project's images
    async fn list_images(&self, project_id: &str, request: PageRequest) -> Result<Page<Image>>;

    /// Delete a batch of tag names or digest-derived pseudo-tags
    ///
    /// Fails as a whole; there is no per-item result.
    async fn delete_images(&self, project_id: &str, image_tags: &[String]) -> Result<()>;
}
