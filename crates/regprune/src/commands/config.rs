//! Config command

use anyhow::{Context, Result};
use camino::Utf8Path;
use regprune_core::ConfigLoader;

use crate::cli::{ConfigCommands, ConfigShowArgs};
use crate::output;

pub fn run(cmd: ConfigCommands, config_path: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, config_path),
        ConfigCommands::Path => path(config_path),
    }
}

fn show(args: ConfigShowArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = ConfigLoader::new()
        .load(config_path)
        .context("Failed to load configuration")?;
    let shown = config.redacted();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        let yaml = serde_yaml_ng::to_string(&shown).context("Failed to render config")?;
        print!("{}", yaml);
    }

    if let Err(e) = config.validate() {
        output::warning(&format!("Configuration is invalid: {}", e));
    }

    Ok(())
}

fn path(config_path: Option<&Utf8Path>) -> Result<()> {
    match config_path {
        Some(p) => output::kv("Config file", p.as_str()),
        None => match ConfigLoader::new().default_path() {
            Some(p) if p.exists() => output::kv("Config file", p.as_str()),
            Some(p) => output::kv("Config file", &format!("{} (not present, using defaults)", p)),
            None => output::warning("No home directory found; using defaults"),
        },
    }
    Ok(())
}
