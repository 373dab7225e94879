//! CLI subcommands

pub mod config;
pub mod learn;
pub mod policy;
pub mod score;
pub mod simulate;

use anyhow::{Context, Result};
use tracing::info;

use civic_rl::PriorityAgent;

use crate::config::Config;

/// Build the agent, seeding it from the configured snapshot when one exists
pub fn open_agent(config: &Config) -> Result<PriorityAgent> {
    match &config.persistence.snapshot_path {
        Some(path) if path.exists() => PriorityAgent::load_from(&config.agent, path)
            .with_context(|| format!("Failed to load policy snapshot {}", path.display())),
        Some(path) => {
            info!("No snapshot at {} yet, starting from an empty policy", path.display());
            Ok(PriorityAgent::new(&config.agent)?)
        }
        None => Ok(PriorityAgent::new(&config.agent)?),
    }
}

/// Persist the agent if a snapshot path is configured. Returns whether it was saved.
pub fn save_agent(agent: &PriorityAgent, config: &Config) -> Result<bool> {
    let Some(path) = &config.persistence.snapshot_path else {
        return Ok(false);
    };
    agent
        .save_to(path)
        .with_context(|| format!("Failed to save policy snapshot {}", path.display()))?;
    Ok(true)
}
