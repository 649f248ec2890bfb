//! regprune CLI - age-based image retention for the Depot registry
//!
//! This is the main entry point for the regprune command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

/// Exit status when configuration or flags are rejected before any API call
const EXIT_INVALID_INPUT: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS operation
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Prune(args) => commands::prune::run(args, cli.config.as_deref()).await,
        Commands::Projects(args) => commands::projects::run(args, cli.config.as_deref()).await,
        Commands::Config(cmd) => commands::config::run(cmd, cli.config.as_deref()),
    };

    if let Err(e) = &result {
        if is_invalid_input(e) {
            output::error(&format!("{:#}", e));
            std::process::exit(EXIT_INVALID_INPUT);
        }
    }

    result
}

/// Whether the failure is a rejected config value rather than a runtime error
fn is_invalid_input(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<regprune_core::Error>()
            .is_some_and(regprune_core::Error::is_validation)
    })
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Per-project progress is logged at info
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stderr keeps --json output on stdout parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
