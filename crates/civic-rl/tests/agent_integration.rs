//! Integration tests for the priority agent
//!
//! These tests drive the agent through its two call sites the way the intake
//! workflow does.

#![allow(clippy::float_cmp)]
#![allow(clippy::cast_precision_loss)]

use std::sync::{Arc, Barrier};
use std::thread;

use civic_core::{CivicError, Priority, RequestStatus};
use civic_rl::{AgentConfig, PendingBucket, PriorityAgent, StateEncoder};

fn agent_with_rate(alpha: f64) -> PriorityAgent {
    PriorityAgent::new(&AgentConfig::default().with_learning_rate(alpha)).unwrap()
}

/// Pothole in Ward 5 with a short queue: untrained agent says High, a
/// rejection pulls only the High estimate down.
#[test]
fn test_rejected_high_priority_scenario() {
    let agent = agent_with_rate(0.1);

    let state = agent.encode("Pothole", "Ward 5", 3);
    assert_eq!(state.pending_bucket(), PendingBucket::Low);

    let assigned = agent.score_new_request("Pothole", "Ward 5", 3);
    assert_eq!(assigned, Priority::High);

    agent
        .learn_from_resolution("Pothole", "Ward 5", 3, assigned, &RequestStatus::Rejected)
        .unwrap();

    let values = agent.values(&state);
    assert!(values.high < 0.0, "High estimate should decrease");
    assert!(values.high >= -5.0, "step must not pass the reward");
    assert!((values.high - -0.5).abs() < 1e-12);
    assert_eq!(values.medium, 0.0);
    assert_eq!(values.low, 0.0);

    // With High now below the others, the next identical request gets Medium
    assert_eq!(agent.score_new_request("Pothole", "Ward 5", 3), Priority::Medium);
}

#[test]
fn test_approvals_reinforce_priority() {
    let agent = agent_with_rate(0.3);

    // Teach the agent that Medium gets approved for streetlights and High gets rejected
    for _ in 0..20 {
        agent
            .learn_from_resolution("Streetlight", "Ward 2", 10, Priority::Medium, &RequestStatus::Approved)
            .unwrap();
        agent
            .learn_from_resolution("Streetlight", "Ward 2", 10, Priority::High, &RequestStatus::Rejected)
            .unwrap();
    }

    assert_eq!(agent.score_new_request("streetlight", "ward 2", 12), Priority::Medium);
    // A different bucket is a different state and is still untrained
    assert_eq!(agent.score_new_request("Streetlight", "Ward 2", 100), Priority::High);
}

#[test]
fn test_repeated_reward_converges() {
    let agent = agent_with_rate(0.25);
    let state = agent.encode("Garbage", "Ward 7", 0);

    let mut previous = 0.0;
    for _ in 0..100 {
        agent.update(&state, Priority::Low, 10.0).unwrap();
        let current = agent.values(&state).low;
        assert!(current <= 10.0);
        assert!(current >= previous);
        assert!(current > previous || current == 10.0);
        previous = current;
    }
    assert!((10.0 - previous).abs() < 1e-6);
}

#[test]
fn test_resolution_uses_current_queue() {
    let agent = agent_with_rate(0.5);

    // Scored with a short queue, resolved after the queue grew
    let assigned = agent.score_new_request("Water Leak", "Ward 3", 2);
    agent
        .learn_from_resolution("Water Leak", "Ward 3", 40, assigned, &RequestStatus::Approved)
        .unwrap();

    let submit_state = agent.encode("Water Leak", "Ward 3", 2);
    let resolve_state = agent.encode("Water Leak", "Ward 3", 40);
    assert_ne!(submit_state, resolve_state);
    assert_eq!(agent.values(&submit_state).high, 0.0);
    assert_eq!(agent.values(&resolve_state).high, 5.0);
}

#[test]
fn test_invalid_action_is_rejected() {
    let agent = PriorityAgent::default();
    for bad in ["Urgent", "", "0", "Highest"] {
        let result = agent.learn_from_stored("Pothole", "Ward 5", 3, bad, "Approved");
        assert!(
            matches!(result, Err(CivicError::InvalidAction(_))),
            "{bad:?} should be rejected"
        );
    }
    assert!(agent.policy().is_empty());
}

#[test]
fn test_select_stays_in_action_set() {
    let agent = PriorityAgent::new(&AgentConfig::default().with_epsilon(0.5)).unwrap();
    for i in 0..200 {
        let p = agent.score_new_request(&format!("Issue {}", i % 7), "Ward 1", i);
        assert!(matches!(p, Priority::High | Priority::Medium | Priority::Low));
    }
}

/// Two resolutions racing on the same state/action must both land.
#[test]
fn test_concurrent_resolutions_are_not_lost() {
    for _ in 0..50 {
        let agent = Arc::new(agent_with_rate(0.5));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [RequestStatus::Approved, RequestStatus::Rejected]
            .into_iter()
            .map(|status| {
                let agent = Arc::clone(&agent);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    agent
                        .learn_from_resolution("Pothole", "Ward 5", 3, Priority::High, &status)
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let state = agent.encode("Pothole", "Ward 5", 3);
        let high = agent.values(&state).high;

        // Approve then reject: 0 -> 5 -> 0. Reject then approve: 0 -> -2.5 -> 3.75.
        // A lost update would leave 5.0 or -2.5.
        assert!(
            (high - 0.0).abs() < 1e-12 || (high - 3.75).abs() < 1e-12,
            "unexpected estimate {high}"
        );
        assert_eq!(agent.stats().unwrap().updates, 2);
    }
}

#[test]
fn test_concurrent_scoring_and_learning() {
    let agent = Arc::new(agent_with_rate(0.1));
    let mut handles = Vec::new();

    for worker in 0..8u64 {
        let agent = Arc::clone(&agent);
        handles.push(thread::spawn(move || {
            for i in 0..250u64 {
                let area = format!("Ward {}", (worker + i) % 4);
                let p = agent.score_new_request("Garbage", &area, i % 30);
                let status = if i % 3 == 0 {
                    RequestStatus::Rejected
                } else {
                    RequestStatus::Approved
                };
                agent
                    .learn_from_resolution("Garbage", &area, i % 30, p, &status)
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = agent.stats().unwrap();
    assert_eq!(stats.scored, 2000);
    assert_eq!(stats.updates, 2000);
    // 4 areas x 3 buckets
    assert_eq!(stats.states, 12);
    for entry in agent.policy() {
        assert!(entry.values.is_finite());
        assert!(entry.values.high <= 10.0 && entry.values.high >= -5.0);
    }
}

#[test]
fn test_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    let config = AgentConfig::default().with_learning_rate(0.5);

    {
        let agent = PriorityAgent::new(&config).unwrap();
        agent
            .learn_from_resolution("Pothole", "Ward 5", 3, Priority::High, &RequestStatus::Rejected)
            .unwrap();
        agent
            .learn_from_resolution("Pothole", "Ward 5", 3, Priority::Medium, &RequestStatus::Approved)
            .unwrap();
        agent.save_to(&path).unwrap();
    }

    let restarted = PriorityAgent::load_from(&config, &path).unwrap();
    assert_eq!(restarted.policy().len(), 1);
    assert_eq!(restarted.score_new_request("Pothole", "Ward 5", 1), Priority::Medium);
}

#[test]
fn test_stats_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    let config = AgentConfig::default().with_learning_rate(0.5);

    let agent = PriorityAgent::new(&config).unwrap();
    for _ in 0..5 {
        let assigned = agent.score_new_request("Water Leak", "Ward 3", 2);
        agent
            .learn_from_resolution("Water Leak", "Ward 3", 2, assigned, &RequestStatus::Approved)
            .unwrap();
    }
    let before = agent.stats().unwrap();
    assert_eq!(before.updates, 5);
    assert_eq!(before.total_reward, 50.0);
    agent.save_to(&path).unwrap();

    let restarted = PriorityAgent::load_from(&config, &path).unwrap();
    let after = restarted.stats().unwrap();
    assert_eq!(after.states, before.states);
    assert_eq!(after.scored, before.scored);
    assert_eq!(after.explored, before.explored);
    assert_eq!(after.updates, before.updates);
    assert_eq!(after.total_reward, before.total_reward);
    assert_eq!(after.average_reward, before.average_reward);
}

#[test]
fn test_restore_over_history_reports_snapshot_stats() {
    let config = AgentConfig::default();
    let source = PriorityAgent::new(&config).unwrap();
    source
        .learn_from_resolution("Pothole", "Ward 5", 3, Priority::High, &RequestStatus::Approved)
        .unwrap();
    let snapshot = source.snapshot().unwrap();

    let agent = PriorityAgent::new(&config).unwrap();
    for _ in 0..7 {
        agent
            .learn_from_resolution("Garbage", "Ward 1", 0, Priority::Low, &RequestStatus::Rejected)
            .unwrap();
    }
    agent.restore(&snapshot).unwrap();

    let stats = agent.stats().unwrap();
    assert_eq!(stats.states, 1);
    assert_eq!(stats.updates, 1);
    assert_eq!(stats.total_reward, 10.0);
}

#[test]
fn test_encoder_matches_agent() {
    let encoder = StateEncoder::default();
    let agent = PriorityAgent::default();
    for pending in [0, 4, 5, 20, 21, 1000] {
        assert_eq!(
            encoder.encode("Fallen Tree", "Ward 11", pending),
            agent.encode("fallen tree", "ward 11", pending)
        );
    }
}
