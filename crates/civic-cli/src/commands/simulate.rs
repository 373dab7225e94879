//! Run the intake workflow against a simulated administrator
//!
//! The administrator has a fixed idea of how urgent each issue type is and
//! approves a request only when the assigned priority matches it. Watching
//! the approval rate climb is the quickest way to see the policy learning.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use civic_core::{InMemoryRequestStore, NewServiceRequest, Priority, RequestStatus};

use super::open_agent;
use crate::config::Config;
use crate::intake::IntakeService;

/// Issue types and the priority the simulated administrator expects
const ISSUES: [(&str, Priority); 6] = [
    ("Water Leak", Priority::High),
    ("Fallen Tree", Priority::High),
    ("Pothole", Priority::Medium),
    ("Streetlight", Priority::Medium),
    ("Garbage", Priority::Low),
    ("Graffiti", Priority::Low),
];

const AREAS: [&str; 4] = ["Ward 1", "Ward 2", "Ward 3", "Ward 4"];

/// Decisions counted toward the recent approval rate
const RECENT_WINDOW: usize = 50;

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of requests to submit
    #[arg(short = 'n', long, default_value_t = 200)]
    pub requests: usize,
    /// Seed for the simulated workload
    #[arg(short, long)]
    pub seed: Option<u64>,
    /// Override the exploration rate for this run
    #[arg(long)]
    pub epsilon: Option<f64>,
}

#[derive(Debug, Default)]
pub struct SimulationReport {
    pub submitted: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Approval rate over the last decisions
    pub recent_approval_rate: f64,
}

pub async fn run(args: SimulateArgs, config: &Config) -> Result<()> {
    let agent = Arc::new(open_agent(config)?);
    if let Some(epsilon) = args.epsilon {
        agent.set_epsilon(epsilon)?;
    }

    let mut service = IntakeService::new(Arc::new(InMemoryRequestStore::new()), agent);
    if config.persistence.autosave {
        if let Some(path) = &config.persistence.snapshot_path {
            service = service.with_autosave(path.clone());
        }
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Simulating {} requests with seed {}", args.requests, seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let report = simulate(&service, args.requests, &mut rng).await?;

    println!("Simulation Results (seed {seed})");
    println!("==================\n");
    println!("Submitted:       {}", report.submitted);
    println!("Approved:        {}", report.approved);
    println!("Rejected:        {}", report.rejected);
    println!(
        "Recent approval: {:.1}% (last {} decisions)",
        report.recent_approval_rate * 100.0,
        RECENT_WINDOW.min(report.approved + report.rejected)
    );

    let stats = service.agent().stats()?;
    println!(
        "\nStates: {}  Updates: {}  Average reward: {:.3}",
        stats.states, stats.updates, stats.average_reward
    );

    println!("\nLearned priorities:");
    for entry in service.agent().policy() {
        println!("  {:<40} {}", entry.state.key(), entry.greedy);
    }
    Ok(())
}

/// Submit `requests` random requests, resolving a random pending one about
/// every other submission, then drain the queue.
pub async fn simulate<R: Rng>(
    service: &IntakeService,
    requests: usize,
    rng: &mut R,
) -> Result<SimulationReport> {
    let mut report = SimulationReport::default();
    let mut recent = VecDeque::with_capacity(RECENT_WINDOW);

    for i in 0..requests {
        let (issue, _) = ISSUES[rng.gen_range(0..ISSUES.len())];
        let area = AREAS[rng.gen_range(0..AREAS.len())];
        let request =
            NewServiceRequest::new(format!("Citizen {i}"), format!("90000{i:05}"), issue, area);
        service.submit(request).await?;
        report.submitted += 1;

        if rng.gen_bool(0.5) {
            resolve_one(service, rng, &mut report, &mut recent).await?;
        }
    }

    while resolve_one(service, rng, &mut report, &mut recent).await? {}

    if !recent.is_empty() {
        let approved = recent.iter().filter(|&&ok| ok).count();
        report.recent_approval_rate = approved as f64 / recent.len() as f64;
    }
    Ok(report)
}

/// Resolve one random pending request. Returns false when the queue is empty.
async fn resolve_one<R: Rng>(
    service: &IntakeService,
    rng: &mut R,
    report: &mut SimulationReport,
    recent: &mut VecDeque<bool>,
) -> Result<bool> {
    let pending: Vec<_> = service
        .list()
        .await?
        .into_iter()
        .filter(|r| r.status.is_pending())
        .collect();
    let Some(request) = pending.choose(rng) else {
        return Ok(false);
    };

    let approve = expected_priority(&request.issue_type) == Some(request.priority);
    let status = if approve {
        report.approved += 1;
        RequestStatus::Approved
    } else {
        report.rejected += 1;
        RequestStatus::Rejected
    };
    service.resolve(request.id, status).await?;

    if recent.len() == RECENT_WINDOW {
        recent.pop_front();
    }
    recent.push_back(approve);
    Ok(true)
}

fn expected_priority(issue_type: &str) -> Option<Priority> {
    ISSUES
        .iter()
        .find(|(issue, _)| *issue == issue_type)
        .map(|(_, priority)| *priority)
}
