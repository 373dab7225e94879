//! Score a request context

use anyhow::Result;
use clap::Args;

use super::open_agent;
use crate::config::Config;

#[derive(Args)]
pub struct ScoreArgs {
    /// Issue type, e.g. "Pothole"
    #[arg(short, long)]
    pub issue: String,
    /// Area or ward
    #[arg(short, long)]
    pub area: String,
    /// Requests currently pending
    #[arg(short, long, default_value_t = 0)]
    pub pending: u64,
}

pub async fn run(args: ScoreArgs, config: &Config) -> Result<()> {
    let agent = open_agent(config)?;
    let state = agent.encode(&args.issue, &args.area, args.pending);
    let priority = agent.score_new_request(&args.issue, &args.area, args.pending);
    let values = agent.values(&state);

    println!("State:    {state}");
    println!(
        "Values:   high={:.3} medium={:.3} low={:.3}",
        values.high, values.medium, values.low
    );
    println!("Priority: {priority}");
    Ok(())
}
