//! Age and exclusion classification of a project's images
//!
//! Classification is two-pass. The first pass walks every image in fetch
//! order and sorts it into delete or keep, collecting candidate digests and
//! keep digests. The second pass, [`reconcile_digests`], removes every digest
//! that a kept tag still references. Only after both passes is a digest
//! considered safe to delete.

use chrono::{DateTime, Duration, Utc};
use regprune_core::types::{ExclusionList, Image};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A tag selected for deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionCandidate {
    /// Trailing tag name passed to the delete call, e.g. "v1"
    pub display_tag: String,
    pub digest: Option<String>,
}

/// Result of classifying one project's images
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionDecision {
    /// Tags to delete, in fetch order
    pub images_to_delete: Vec<DeletionCandidate>,
    /// Digests no kept tag references, in first-seen order, without duplicates
    pub safe_digests: Vec<String>,
    /// Tagged images that stay
    pub kept: usize,
    /// Images without a tag
    pub skipped: usize,
    /// Candidate digests withheld because a kept tag shares them
    pub rescued_digests: usize,
}

/// Instant at or before which an image counts as old
///
/// A period reaching back past the earliest representable instant yields
/// that instant, so nothing counts as old.
pub fn cutoff(now: DateTime<Utc>, age_cutoff_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(age_cutoff_days))
        .and_then(|period| now.checked_sub_signed(period))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Decide which of `images` to delete
///
/// Pure: logs each decision but has no other effect and does not touch
/// `images`.
pub fn classify(
    images: &[Image],
    age_cutoff_days: u32,
    project_id: &str,
    exclusions: &ExclusionList,
    now: DateTime<Utc>,
) -> RetentionDecision {
    let cutoff = cutoff(now, age_cutoff_days);
    info!(
        days = age_cutoff_days,
        cutoff = %cutoff.to_rfc3339(),
        exclusions = %exclusions,
        "Filtering images"
    );

    let mut images_to_delete = Vec::new();
    let mut candidate_digests: Vec<&str> = Vec::new();
    let mut keep_digests: HashSet<&str> = HashSet::new();
    let mut kept = 0;
    let mut skipped = 0;

    for image in images {
        let (Some(reference), Some(tag_name)) = (image.tag.as_deref(), image.tag_name()) else {
            debug!(
                digest = image.digest.as_deref().unwrap_or("unknown"),
                "Skipping image with no tag"
            );
            skipped += 1;
            continue;
        };
        let digest = image.digest.as_deref();

        if let Some(reason) = exclusions.find_match(project_id, tag_name) {
            debug!(tag = tag_name, "Keeping image ({})", reason);
            keep_digests.extend(digest);
            kept += 1;
            continue;
        }

        let Some(pushed_at) = image.pushed_at else {
            warn!(tag = reference, "Image has no push time, keeping it");
            keep_digests.extend(digest);
            kept += 1;
            continue;
        };

        if pushed_at <= cutoff {
            debug!(tag = tag_name, pushed_at = %pushed_at.to_rfc3339(), "Marking for deletion");
            images_to_delete.push(DeletionCandidate {
                display_tag: tag_name.to_string(),
                digest: digest.map(str::to_string),
            });
            candidate_digests.extend(digest);
        } else {
            debug!(tag = tag_name, pushed_at = %pushed_at.to_rfc3339(), "Keeping image, too recent");
            keep_digests.extend(digest);
            kept += 1;
        }
    }

    let reconciled = reconcile_digests(&candidate_digests, &keep_digests);
    if reconciled.rescued > 0 {
        info!(
            rescued = reconciled.rescued,
            "Skipping digest(s) still referenced by other tags"
        );
    }

    RetentionDecision {
        images_to_delete,
        safe_digests: reconciled.safe,
        kept,
        skipped,
        rescued_digests: reconciled.rescued,
    }
}

/// Outcome of [`reconcile_digests`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledDigests {
    pub safe: Vec<String>,
    /// Distinct candidates dropped because they are also kept
    pub rescued: usize,
}

/// Subtract every kept digest from the candidate digests
///
/// Must run over the complete image set: a tag seen late in the listing can
/// rescue a digest an earlier tag nominated.
pub fn reconcile_digests(candidates: &[&str], keep: &HashSet<&str>) -> ReconciledDigests {
    let mut seen = HashSet::new();
    let mut safe = Vec::new();
    let mut rescued = 0;

    for digest in candidates.iter().copied() {
        if !seen.insert(digest) {
            continue;
        }
        if keep.contains(digest) {
            rescued += 1;
        } else {
            safe.push(digest.to_string());
        }
    }

    ReconciledDigests { safe, rescued }
}
