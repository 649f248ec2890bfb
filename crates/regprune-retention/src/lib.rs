//! # regprune-retention
//!
//! Retention engine for regprune:
//! - [`fetch_all`] drains a cursor-paginated listing
//! - [`classify`] decides which tags and digests are safe to delete
//! - [`apply`] issues the tag and digest deletions, gated by dry-run
//! - [`Pruner`] runs the three over one or all projects with per-project
//!   failure isolation

pub mod clock;
pub mod deleter;
pub mod filter;
pub mod orchestrator;
pub mod pagination;

pub use clock::{Clock, FixedClock, SystemClock};
pub use deleter::{apply, digest_tag, DeletionOutcome};
pub use filter::{classify, reconcile_digests, DeletionCandidate, RetentionDecision};
pub use orchestrator::{ProjectReport, ProjectSelector, PruneOptions, Pruner, RunPhase, RunSummary};
pub use pagination::{fetch_all, fetch_listing, Listing};
