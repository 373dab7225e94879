//! Feed an administrator decision back to the policy

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use super::{open_agent, save_agent};
use crate::config::Config;

#[derive(Args)]
pub struct LearnArgs {
    /// Issue type of the resolved request
    #[arg(short, long)]
    pub issue: String,
    /// Area or ward
    #[arg(short, long)]
    pub area: String,
    /// Priority the request was assigned (High, Medium, Low)
    #[arg(long)]
    pub priority: String,
    /// Final status (Approved, Rejected, ...)
    #[arg(long)]
    pub status: String,
    /// Requests pending at resolution time
    #[arg(short, long, default_value_t = 0)]
    pub pending: u64,
}

pub async fn run(args: LearnArgs, config: &Config) -> Result<()> {
    let agent = open_agent(config)?;
    agent
        .learn_from_stored(
            &args.issue,
            &args.area,
            args.pending,
            &args.priority,
            &args.status,
        )
        .context("Failed to apply decision")?;

    let state = agent.encode(&args.issue, &args.area, args.pending);
    let values = agent.values(&state);
    println!("Updated {state}");
    println!(
        "  high={:.3} medium={:.3} low={:.3}",
        values.high, values.medium, values.low
    );

    if !save_agent(&agent, config)? {
        warn!("No persistence.snapshot_path configured, update was not saved");
    }
    Ok(())
}
