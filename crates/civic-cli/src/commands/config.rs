//! Configuration management commands

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::{Config, CONFIG_FILE};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a configuration file with default values
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(cmd: ConfigCommands, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config),
        ConfigCommands::Init { force } => init(force),
    }
}

fn show(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    match Config::find_config_file() {
        Some(path) => println!("# Config file: {}\n", path.display()),
        None => println!("# No configuration file found, showing defaults\n"),
    }
    println!("{}", config.to_toml()?);
    Ok(())
}

fn init(force: bool) -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() && !force {
        println!("Configuration file already exists: {CONFIG_FILE}");
        println!("Use --force to overwrite");
        return Ok(());
    }

    let rendered = Config::default().to_toml()?;
    std::fs::write(path, rendered)
        .with_context(|| format!("Failed to write {CONFIG_FILE}"))?;
    println!("Created configuration file: {CONFIG_FILE}");
    Ok(())
}
