//! Projects command

use anyhow::Result;
use camino::Utf8Path;
use regprune_registry::RegistryApi;
use regprune_retention::fetch_all;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::ProjectsArgs;
use crate::commands::{connect, listing_failed, resolve_config};
use crate::output;

#[derive(Tabled, Serialize)]
struct ProjectRow {
    #[tabled(rename = "PROJECT ID")]
    project_id: String,
    #[tabled(rename = "NAME")]
    name: String,
}

pub async fn run(args: ProjectsArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = resolve_config(config_path, args.overrides())?;
    let client = connect(&config)?;

    let api: &dyn RegistryApi = &client;
    let projects = fetch_all(move |req| api.list_projects(req), config.fetch.page_size, None)
        .await
        .map_err(listing_failed)?;

    let rows: Vec<ProjectRow> = projects
        .into_iter()
        .map(|p| ProjectRow {
            name: p.name.clone().unwrap_or_default(),
            project_id: p.project_id,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        output::warning("No projects found");
        return Ok(());
    }

    let count = rows.len();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
    output::info(&format!("{} project(s)", count));

    Ok(())
}
