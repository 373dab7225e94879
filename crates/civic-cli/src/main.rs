//! Civic CLI - Priority agent operations from the command line
//!
//! The web front end embeds the same intake workflow; this binary is for
//! administrators inspecting or adjusting the learned policy and for
//! exercising the agent against a simulated administrator.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod intake;

use commands::{config as config_cmd, learn, policy, score, simulate};
use config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(name = "civic")]
#[command(author, version, about = "Civic intake - priority agent tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign a priority to a request context
    Score(score::ScoreArgs),

    /// Feed an administrator decision back to the policy
    Learn(learn::LearnArgs),

    /// Inspect or reset the learned policy
    #[command(subcommand)]
    Policy(policy::PolicyCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),

    /// Run the intake workflow against a simulated administrator
    Simulate(simulate::SimulateArgs),
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("civic={level},civic_rl={level},civic_core={level}").into()
    });

    let json = logging.json.then(|| tracing_subscriber::fmt::layer().json());
    let plain = (!logging.json).then(|| tracing_subscriber::fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from civic.env file (before reading config)
    civic_core::util::load_env_file();

    let cli = Cli::parse();
    let (config, config_file) = Config::load()?;

    init_logging(&config.logging, cli.verbose);
    tracing::info!("{}", Config::source_description(config_file.as_deref()));

    match cli.command {
        Commands::Score(args) => score::run(args, &config).await,
        Commands::Learn(args) => learn::run(args, &config).await,
        Commands::Policy(cmd) => policy::run(cmd, &config).await,
        Commands::Config(cmd) => config_cmd::run(cmd, &config).await,
        Commands::Simulate(args) => simulate::run(args, &config).await,
    }
}
