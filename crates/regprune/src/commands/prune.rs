//! Prune command

use anyhow::Result;
use camino::Utf8Path;
use regprune_core::PruneConfig;
use regprune_retention::{
    ProjectReport, ProjectSelector, PruneOptions, Pruner, RunSummary, SystemClock,
};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::PruneArgs;
use crate::commands::{connect, listing_failed, resolve_config};
use crate::output;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "PROJECT")]
    project: String,
    #[tabled(rename = "IMAGES")]
    images: usize,
    #[tabled(rename = "TAGS")]
    planned_tags: usize,
    #[tabled(rename = "DIGESTS")]
    planned_digests: usize,
    #[tabled(rename = "DELETED")]
    deleted: usize,
    #[tabled(rename = "ERRORS")]
    errors: usize,
    #[tabled(rename = "STATUS")]
    status: &'static str,
}

impl ReportRow {
    fn new(report: &ProjectReport, dry_run: bool) -> Self {
        Self {
            project: report.project.to_string(),
            images: report.images,
            planned_tags: report.planned_tags,
            planned_digests: report.planned_digests,
            deleted: report.outcome.success,
            errors: report.outcome.errors,
            status: report.status(dry_run),
        }
    }
}

pub async fn run(args: PruneArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = resolve_config(config_path, args.overrides())?;
    let client = connect(&config)?;
    let options = prune_options(&config, args.confirm)?;

    if !args.json {
        print_plan(&args, &options);
    }

    let pruner = Pruner::new(Arc::new(client), Arc::new(SystemClock), options);
    let selector = ProjectSelector::from_option(args.project.clone());
    let summary = pruner
        .run(&selector)
        .await
        .map_err(listing_failed)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &args, config_path);
    }

    Ok(())
}

fn prune_options(config: &PruneConfig, confirm: bool) -> Result<PruneOptions> {
    Ok(PruneOptions {
        age_cutoff_days: config.retention_days(),
        exclusions: config.exclusion_list()?,
        page_size: config.fetch.page_size,
        max_images: config.fetch.max_images,
        dry_run: !confirm,
    })
}

fn print_plan(args: &PruneArgs, options: &PruneOptions) {
    output::header(if options.dry_run {
        "Image retention (dry run)"
    } else {
        "Image retention"
    });
    output::kv("Projects", args.project.as_deref().unwrap_or("all projects"));
    output::kv(
        "Delete images older than",
        &format!("{} day(s)", options.age_cutoff_days),
    );
    output::kv("Excluded tags", &options.exclusions.to_string());
    if let Some(max) = options.max_images {
        output::kv("Max images per project", &max.to_string());
    }
}

fn print_summary(summary: &RunSummary, args: &PruneArgs, config_path: Option<&Utf8Path>) {
    if summary.projects.is_empty() {
        output::warning("No projects found");
        return;
    }

    let rows: Vec<ReportRow> = summary
        .projects
        .iter()
        .map(|r| ReportRow::new(r, summary.dry_run))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("\n{}", table);

    for failed in summary.failed_projects() {
        output::error(&format!(
            "{}: {}",
            failed.project,
            failed.error.as_deref().unwrap_or("unknown error")
        ));
    }
    for capped in summary.projects.iter().filter(|p| p.listing_truncated) {
        output::warning(&format!(
            "{}: listing stopped at the image limit, digests were not deleted",
            capped.project
        ));
    }

    output::header("Summary");
    output::kv("Projects processed", &summary.total_projects().to_string());
    if summary.dry_run {
        output::kv("Tags to delete", &summary.planned_tags.to_string());
        output::kv("Digests to delete", &summary.planned_digests.to_string());
    } else {
        output::kv("Images deleted", &summary.total_success().to_string());
        output::kv("Digests deleted", &summary.totals.digests_deleted.to_string());
        if summary.total_errors() > 0 {
            output::kv("Errors", &summary.total_errors().to_string());
        }
    }

    if summary.has_pending_deletions() {
        println!();
        output::warning("This was a DRY RUN. No images were actually deleted.");
        output::info("To actually delete images, run with --confirm:");
        output::command(&rerun_command(args, config_path, summary.age_cutoff_days));
    } else if summary.dry_run {
        output::success("Nothing to delete");
    } else if summary.total_errors() == 0 {
        output::success(&format!("Deleted {} image(s)", summary.total_success()));
    }
}

/// The command that repeats this run with deletion enabled
///
/// Carries every flag that shapes the image set, so the confirmed run
/// deletes what the dry run reported.
fn rerun_command(args: &PruneArgs, config_path: Option<&Utf8Path>, days: u32) -> String {
    let mut parts = vec!["regprune".to_string()];
    if let Some(path) = config_path {
        parts.push(format!("--config {}", shell_quote(path.as_str())));
    }
    parts.push("prune".to_string());
    if let Some(project) = &args.project {
        parts.push(shell_quote(project));
    }
    parts.push(format!("--days {}", days));
    for rule in &args.exclude {
        parts.push(format!("--exclude {}", shell_quote(rule)));
    }
    if args.no_default_exclusions {
        parts.push("--no-default-exclusions".to_string());
    }
    if let Some(max) = args.max_images {
        parts.push(format!("--max-images {}", max));
    }
    if let Some(url) = &args.api.api_url {
        parts.push(format!("--api-url {}", shell_quote(url)));
    }
    if let Some(size) = args.api.page_size {
        parts.push(format!("--page-size {}", size));
    }
    parts.push("--confirm".to_string());
    parts.join(" ")
}

/// Quote `value` for a POSIX shell when it holds anything beyond plain word characters
fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.:/@%+=,".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}
