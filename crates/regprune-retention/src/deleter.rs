//! Applies a retention decision through the registry delete call

use crate::filter::DeletionCandidate;
use regprune_registry::RegistryApi;
use serde::Serialize;
use tracing::{error, info};

/// Counts produced by deleting one project's images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    /// Tags deleted
    pub success: usize,
    /// Tags whose deletion call failed
    pub errors: usize,
    /// Digests deleted; not part of `success`
    pub digests_deleted: usize,
}

impl DeletionOutcome {
    pub fn merge(&mut self, other: DeletionOutcome) {
        self.success += other.success;
        self.errors += other.errors;
        self.digests_deleted += other.digests_deleted;
    }
}

/// Rewrite a digest into the tag-shaped form the delete call accepts
///
/// Only the first ':' is replaced: "sha256:abc" becomes "sha256-abc".
pub fn digest_tag(digest: &str) -> String {
    digest.replacen(':', "-", 1)
}

/// Delete `images_to_delete`, then `safe_digests`
///
/// Nothing is deleted when `images_to_delete` is empty or `dry_run` is set.
/// A failed tag deletion is counted in `errors` and the digest deletion is
/// still attempted. A failed digest deletion is logged only.
pub async fn apply(
    api: &dyn RegistryApi,
    project_id: &str,
    images_to_delete: &[DeletionCandidate],
    safe_digests: &[String],
    dry_run: bool,
) -> DeletionOutcome {
    let mut outcome = DeletionOutcome::default();

    if images_to_delete.is_empty() {
        info!(project = project_id, "No images to delete");
        return outcome;
    }

    let tags: Vec<String> = images_to_delete
        .iter()
        .map(|c| c.display_tag.clone())
        .collect();

    info!(
        project = project_id,
        tags = tags.len(),
        digests = safe_digests.len(),
        dry_run,
        "{}",
        if dry_run { "Would delete" } else { "Deleting" }
    );

    if dry_run {
        return outcome;
    }

    match api.delete_images(project_id, &tags).await {
        Ok(()) => {
            info!(project = project_id, count = tags.len(), "Deleted tag(s)");
            outcome.success += tags.len();
        }
        Err(e) => {
            error!(project = project_id, count = tags.len(), "Failed to delete tags: {}", e);
            outcome.errors += tags.len();
        }
    }

    if !safe_digests.is_empty() {
        let digest_tags: Vec<String> = safe_digests.iter().map(|d| digest_tag(d)).collect();
        match api.delete_images(project_id, &digest_tags).await {
            Ok(()) => {
                info!(project = project_id, count = digest_tags.len(), "Deleted digest(s)");
                outcome.digests_deleted += digest_tags.len();
            }
            Err(e) => {
                error!(project = project_id, "Failed to delete digests: {}", e);
            }
        }
    }

    outcome
}
