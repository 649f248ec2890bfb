//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use regprune_core::ConfigOverrides;

/// regprune - delete old images from the Depot registry
#[derive(Parser, Debug)]
#[command(name = "regprune")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config file (default: ~/.regprune/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Delete images older than the retention window (dry run unless --confirm)
    Prune(PruneArgs),

    /// List projects in the organization
    Projects(ProjectsArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Options shared by commands that talk to the API
#[derive(Args, Debug, Clone, Default)]
pub struct ApiArgs {
    /// Registry API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Items requested per listing call (1-1000)
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PruneArgs {
    /// Project to prune; all projects when omitted
    pub project: Option<String>,

    /// Delete images pushed this many days ago or earlier
    #[arg(short, long, allow_negative_numbers = true)]
    pub days: Option<i64>,

    /// Actually delete (default is a dry run)
    #[arg(long)]
    pub confirm: bool,

    /// Never delete this tag; `tag` for every project or `project:tag` for one
    #[arg(short, long = "exclude", value_name = "RULE")]
    pub exclude: Vec<String>,

    /// Ignore exclusions from config and use only --exclude
    #[arg(long)]
    pub no_default_exclusions: bool,

    /// Stop listing a project's images after this many
    #[arg(long, value_name = "N")]
    pub max_images: Option<usize>,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Output the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl PruneArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api.api_url.clone(),
            days: self.days,
            exclude: self.exclude.clone(),
            no_default_exclusions: self.no_default_exclusions,
            page_size: self.api.page_size,
            max_images: self.max_images,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectsArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProjectsArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api.api_url.clone(),
            page_size: self.api.page_size,
            ..ConfigOverrides::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration (token redacted)
    Show(ConfigShowArgs),

    /// Print where the config file is looked up
    Path,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
