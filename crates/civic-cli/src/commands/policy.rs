//! Policy inspection commands

use anyhow::{Context, Result};
use clap::Subcommand;

use super::{open_agent, save_agent};
use crate::config::Config;

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Print every known state with its value estimates
    Show {
        /// Print the snapshot JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show learning statistics
    Stats,
    /// Forget everything learned
    Reset {
        /// Skip the confirmation check
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(cmd: PolicyCommands, config: &Config) -> Result<()> {
    match cmd {
        PolicyCommands::Show { json } => show(config, json),
        PolicyCommands::Stats => stats(config),
        PolicyCommands::Reset { force } => reset(config, force),
    }
}

fn show(config: &Config, json: bool) -> Result<()> {
    let agent = open_agent(config)?;

    if json {
        let snapshot = agent.snapshot()?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let entries = agent.policy();
    if entries.is_empty() {
        println!("No states learned yet.");
        return Ok(());
    }

    println!(
        "{:<40} {:>9} {:>9} {:>9}  {}",
        "STATE", "HIGH", "MEDIUM", "LOW", "BEST"
    );
    println!("{}", "-".repeat(80));
    for entry in entries {
        println!(
            "{:<40} {:>9.3} {:>9.3} {:>9.3}  {}",
            entry.state.key(),
            entry.values.high,
            entry.values.medium,
            entry.values.low,
            entry.greedy
        );
    }
    Ok(())
}

fn stats(config: &Config) -> Result<()> {
    let agent = open_agent(config)?;
    let stats = agent.stats()?;

    println!("Policy Statistics");
    println!("=================\n");
    println!("States:         {}", stats.states);
    println!("Scored:         {}", stats.scored);
    println!("Explored:       {}", stats.explored);
    println!("Updates:        {}", stats.updates);
    println!("Total reward:   {:.2}", stats.total_reward);
    println!("Average reward: {:.3}", stats.average_reward);
    println!("Learning rate:  {}", stats.learning_rate);
    println!("Epsilon:        {}", stats.epsilon);
    if let Some(path) = &config.persistence.snapshot_path {
        println!("Snapshot:       {}", path.display());
    }
    Ok(())
}

fn reset(config: &Config, force: bool) -> Result<()> {
    let Some(path) = &config.persistence.snapshot_path else {
        println!("No persistence.snapshot_path configured, nothing to reset.");
        return Ok(());
    };

    if !force {
        println!("This discards every learned estimate in {}", path.display());
        println!("Use --force to confirm");
        return Ok(());
    }

    let agent = open_agent(config)?;
    let states = agent.policy().len();
    agent.reset().context("Failed to reset policy")?;
    save_agent(&agent, config)?;
    println!("Policy reset ({states} states discarded)");
    Ok(())
}
