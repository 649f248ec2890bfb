//! Drives projects through fetch, classify and delete
//!
//! Projects run one after another. A failure inside one project is logged
//! and recorded on that project's report; the batch carries on. Only a
//! failure to list the project directory aborts the run.

use crate::clock::Clock;
use crate::deleter::{self, DeletionOutcome};
use crate::filter::{self, RetentionDecision};
use crate::pagination::{fetch_all, fetch_listing};
use chrono::{DateTime, Utc};
use regprune_core::types::{ExclusionList, Project};
use regprune_registry::{RegistryApi, RegistryError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Which projects a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelector {
    /// One project, by id
    Single(String),
    /// Every project in the directory
    All,
}

impl ProjectSelector {
    pub fn from_option(project_id: Option<String>) -> Self {
        match project_id {
            Some(id) => Self::Single(id),
            None => Self::All,
        }
    }
}

/// Phase of a run, logged as it advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    ResolvingProjects,
    ProcessingProject,
    Summarizing,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ResolvingProjects => "resolving-projects",
            Self::ProcessingProject => "processing-project",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Policy and limits for a run
#[derive(Debug, Clone)]
pub struct PruneOptions {
    pub age_cutoff_days: u32,
    pub exclusions: ExclusionList,
    pub page_size: u32,
    pub max_images: Option<usize>,
    pub dry_run: bool,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            age_cutoff_days: 30,
            exclusions: ExclusionList::default(),
            page_size: 100,
            max_images: None,
            dry_run: true,
        }
    }
}

/// What happened to one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectReport {
    pub project: Project,
    /// Images listed
    pub images: usize,
    /// Tags the filter selected
    pub planned_tags: usize,
    /// Digests the filter found safe
    pub planned_digests: usize,
    pub rescued_digests: usize,
    /// The image listing stopped at `max_images`; no digests were deleted
    pub listing_truncated: bool,
    pub outcome: DeletionOutcome,
    /// Set when the project could not be processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProjectReport {
    fn empty(project: &Project) -> Self {
        Self {
            project: project.clone(),
            images: 0,
            planned_tags: 0,
            planned_digests: 0,
            rescued_digests: 0,
            listing_truncated: false,
            outcome: DeletionOutcome::default(),
            error: None,
        }
    }

    fn failed(project: &Project, message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::empty(project)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Short status word for reports
    pub fn status(&self, dry_run: bool) -> &'static str {
        if self.is_failed() {
            "failed"
        } else if self.planned_tags == 0 {
            "clean"
        } else if dry_run {
            "planned"
        } else if self.outcome.errors > 0 {
            "errors"
        } else {
            "pruned"
        }
    }
}

/// Aggregated result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub age_cutoff_days: u32,
    pub projects: Vec<ProjectReport>,
    pub totals: DeletionOutcome,
    pub planned_tags: usize,
    pub planned_digests: usize,
}

impl RunSummary {
    fn new(options: &PruneOptions) -> Self {
        Self {
            dry_run: options.dry_run,
            age_cutoff_days: options.age_cutoff_days,
            projects: Vec::new(),
            totals: DeletionOutcome::default(),
            planned_tags: 0,
            planned_digests: 0,
        }
    }

    fn record(&mut self, report: ProjectReport) {
        self.totals.merge(report.outcome);
        self.planned_tags += report.planned_tags;
        self.planned_digests += report.planned_digests;
        self.projects.push(report);
    }

    pub fn total_projects(&self) -> usize {
        self.projects.len()
    }

    pub fn total_success(&self) -> usize {
        self.totals.success
    }

    pub fn total_errors(&self) -> usize {
        self.totals.errors
    }

    /// Projects that could not be processed
    pub fn failed_projects(&self) -> impl Iterator<Item = &ProjectReport> {
        self.projects.iter().filter(|p| p.is_failed())
    }

    /// Whether a dry run found anything a confirmed run would delete
    pub fn has_pending_deletions(&self) -> bool {
        self.dry_run && self.planned_tags > 0
    }
}

/// Runs retention over one or all projects
pub struct Pruner {
    api: Arc<dyn RegistryApi>,
    clock: Arc<dyn Clock>,
    options: PruneOptions,
}

impl Pruner {
    pub fn new(api: Arc<dyn RegistryApi>, clock: Arc<dyn Clock>, options: PruneOptions) -> Self {
        Self {
            api,
            clock,
            options,
        }
    }

    /// List the project directory
    pub async fn list_projects(&self) -> Result<Vec<Project>, RegistryError> {
        let api = self.api.as_ref();
        fetch_all(move |req| api.list_projects(req), self.options.page_size, None).await
    }

    /// Process every selected project and summarize
    ///
    /// Fails only when the project directory cannot be listed.
    pub async fn run(&self, selector: &ProjectSelector) -> Result<RunSummary, RegistryError> {
        let mut phase = RunPhase::Idle;
        self.advance(&mut phase, RunPhase::ResolvingProjects);

        let projects = match selector {
            ProjectSelector::Single(id) => {
                info!(project = %id, "Processing single project");
                vec![Project::new(id.clone())]
            }
            ProjectSelector::All => {
                info!("Fetching all projects");
                let projects = self.list_projects().await?;
                info!(count = projects.len(), "Found projects");
                projects
            }
        };

        let now = self.clock.now();
        let mut summary = RunSummary::new(&self.options);

        for project in &projects {
            self.advance(&mut phase, RunPhase::ProcessingProject);
            summary.record(self.process_project(project, now).await);
        }

        self.advance(&mut phase, RunPhase::Summarizing);
        info!(
            projects = summary.total_projects(),
            deleted = summary.total_success(),
            errors = summary.total_errors(),
            digests = summary.totals.digests_deleted,
            dry_run = summary.dry_run,
            "Run complete"
        );
        self.advance(&mut phase, RunPhase::Done);

        Ok(summary)
    }

    fn advance(&self, phase: &mut RunPhase, next: RunPhase) {
        if *phase != next {
            debug!(from = %phase, to = %next, "Run phase");
            *phase = next;
        }
    }

    async fn process_project(&self, project: &Project, now: DateTime<Utc>) -> ProjectReport {
        info!(project = %project, "Processing project");
        match self.try_process_project(project, now).await {
            Ok(report) => report,
            Err(e) => {
                error!(project = %project, "Error processing project: {}", e);
                ProjectReport::failed(project, e.to_string())
            }
        }
    }

    async fn try_process_project(
        &self,
        project: &Project,
        now: DateTime<Utc>,
    ) -> Result<ProjectReport, RegistryError> {
        let api = self.api.as_ref();
        let project_id = project.project_id.as_str();
        let listing = fetch_listing(
            move |req| api.list_images(project_id, req),
            self.options.page_size,
            self.options.max_images,
        )
        .await?;
        let images = listing.items;
        info!(project = %project, count = images.len(), "Fetched images");

        if images.is_empty() {
            info!(project = %project, "No images found");
            return Ok(ProjectReport::empty(project));
        }

        let mut decision: RetentionDecision = filter::classify(
            &images,
            self.options.age_cutoff_days,
            project_id,
            &self.options.exclusions,
            now,
        );

        // Tags past the limit were never seen, so any digest may still be in use
        if listing.truncated && !decision.safe_digests.is_empty() {
            warn!(
                project = %project,
                withheld = decision.safe_digests.len(),
                "Image listing stopped at the limit, not deleting digests"
            );
            decision.safe_digests.clear();
        }

        let outcome = deleter::apply(
            api,
            project_id,
            &decision.images_to_delete,
            &decision.safe_digests,
            self.options.dry_run,
        )
        .await;

        Ok(ProjectReport {
            project: project.clone(),
            images: images.len(),
            planned_tags: decision.images_to_delete.len(),
            planned_digests: decision.safe_digests.len(),
            rescued_digests: decision.rescued_digests,
            listing_truncated: listing.truncated,
            outcome,
            error: None,
        })
    }
}
