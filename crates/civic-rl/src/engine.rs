//! Policy Engine - Owns the table and runs selection and updates
//!
//! The engine is single-owner; [`crate::PriorityAgent`] wraps it in a lock
//! for the web layer's concurrent call sites.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use civic_core::{CivicError, Result};

use crate::config::{validate_epsilon, AgentConfig};
use crate::learning::{LearningRule, ValueUpdate};
use crate::selector::{ActionSelector, Selection};
use crate::snapshot::{PolicyCounters, PolicySnapshot, SnapshotEntry};
use crate::state::{Action, Reward, State, StateEncoder};
use crate::table::{ActionValues, PolicyTable};

/// Tabular policy engine
pub struct PolicyEngine {
    table: PolicyTable,
    encoder: StateEncoder,
    selector: ActionSelector,
    rule: LearningRule,
    scored: AtomicU64,
    explored: AtomicU64,
    updates: u64,
    total_reward: f64,
}

impl PolicyEngine {
    /// Create an engine from validated configuration
    pub fn new(config: &AgentConfig) -> Result<Self> {
        config.validate()?;
        let tie_break = config.tie_break_order()?;

        info!(
            "Policy engine initialized: learning_rate={}, epsilon={}, buckets=<{}/>{}",
            config.learning_rate, config.epsilon, config.buckets.low_below, config.buckets.high_above
        );

        Ok(Self {
            table: PolicyTable::new(),
            encoder: StateEncoder::new(config.buckets),
            selector: ActionSelector::new(config.epsilon, tie_break),
            rule: LearningRule::new(config.learning_rate)?,
            scored: AtomicU64::new(0),
            explored: AtomicU64::new(0),
            updates: 0,
            total_reward: 0.0,
        })
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    pub fn encode(&self, issue_type: &str, area: &str, pending_count: u64) -> State {
        self.encoder.encode(issue_type, area, pending_count)
    }

    /// Whether `state` already has a table entry
    pub fn knows(&self, state: &State) -> bool {
        self.table.contains(state)
    }

    /// Create the entry for `state` if it does not exist yet
    pub fn register(&mut self, state: &State) {
        if !self.table.contains(state) {
            debug!("New state observed: {}", state);
            self.table.entry_mut(state);
        }
    }

    pub fn values(&self, state: &State) -> ActionValues {
        self.table.get(state)
    }

    /// Choose a priority for `state`. Takes `&self` so concurrent readers can score.
    pub fn select<R: Rng + ?Sized>(&self, state: &State, rng: &mut R) -> Selection {
        let values = self.table.get(state);
        let selection = self.selector.select(&values, rng);

        self.scored.fetch_add(1, Ordering::Relaxed);
        if selection.explored {
            self.explored.fetch_add(1, Ordering::Relaxed);
        }

        debug!(
            "Selected {} for {} (explored: {}, values: {:?})",
            selection.action, state, selection.explored, values
        );
        selection
    }

    /// Greedy choice without exploration or bookkeeping
    pub fn greedy(&self, state: &State) -> Action {
        self.selector.greedy(&self.table.get(state))
    }

    /// Apply a reward to `(state, action)`
    pub fn update(&mut self, state: &State, action: Action, reward: Reward) -> Result<ValueUpdate> {
        let update = self.rule.apply(&mut self.table, state, action, reward)?;
        self.updates += 1;
        self.total_reward += reward;

        debug!(
            "Updated {} / {}: {:.4} -> {:.4} (reward {})",
            state, action, update.previous, update.current, reward
        );
        Ok(update)
    }

    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        validate_epsilon(epsilon)?;
        self.selector.set_epsilon(epsilon);
        info!("Exploration rate set to {}", epsilon);
        Ok(())
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        self.rule = LearningRule::new(learning_rate)?;
        info!("Learning rate set to {}", learning_rate);
        Ok(())
    }

    /// All entries ordered by state, with the greedy choice for each
    pub fn entries(&self) -> Vec<PolicyEntry> {
        self.table
            .sorted()
            .into_iter()
            .map(|(state, values)| PolicyEntry {
                state: state.clone(),
                values: *values,
                greedy: self.selector.greedy(values),
            })
            .collect()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            states: self.table.len(),
            scored: self.scored.load(Ordering::Relaxed),
            explored: self.explored.load(Ordering::Relaxed),
            updates: self.updates,
            total_reward: self.total_reward,
            average_reward: if self.updates > 0 {
                self.total_reward / self.updates as f64
            } else {
                0.0
            },
            learning_rate: self.rule.alpha(),
            epsilon: self.selector.epsilon(),
        }
    }

    /// Full copy of the learned table and the parameters it was learned with
    pub fn snapshot(&self) -> PolicySnapshot {
        let entries = self
            .table
            .sorted()
            .into_iter()
            .map(|(state, values)| SnapshotEntry::new(state, *values))
            .collect();
        PolicySnapshot::new(
            self.rule.alpha(),
            self.selector.epsilon(),
            self.encoder.bounds(),
            self.counters(),
            entries,
        )
    }

    fn counters(&self) -> PolicyCounters {
        PolicyCounters {
            scored: self.scored.load(Ordering::Relaxed),
            explored: self.explored.load(Ordering::Relaxed),
            updates: self.updates,
            total_reward: self.total_reward,
        }
    }

    /// Replace the table and counters with the snapshot's.
    ///
    /// Learning rate, epsilon and bucket bounds stay as configured; the
    /// snapshot's copies of them are informational. On error nothing changes.
    pub fn restore(&mut self, snapshot: &PolicySnapshot) -> Result<usize> {
        snapshot.validate()?;
        if snapshot.buckets != self.encoder.bounds() {
            warn!(
                "Snapshot bucket bounds {:?} differ from configured {:?}; bucket labels are kept as stored",
                snapshot.buckets,
                self.encoder.bounds()
            );
        }

        let mut table = PolicyTable::new();
        for entry in &snapshot.entries {
            let state = entry.state();
            if table.contains(&state) {
                return Err(CivicError::Snapshot(format!("duplicate state {state}")));
            }
            table.insert(state, entry.values);
        }

        let restored = table.len();
        let counters = snapshot.counters;
        self.table = table;
        self.scored.store(counters.scored, Ordering::Relaxed);
        self.explored.store(counters.explored, Ordering::Relaxed);
        self.updates = counters.updates;
        self.total_reward = counters.total_reward;
        info!(
            "Restored {} policy entries ({} updates recorded)",
            restored, counters.updates
        );
        Ok(restored)
    }

    /// Forget everything learned and reset counters
    pub fn reset(&mut self) {
        self.table.clear();
        self.scored.store(0, Ordering::Relaxed);
        self.explored.store(0, Ordering::Relaxed);
        self.updates = 0;
        self.total_reward = 0.0;
        info!("Policy table reset");
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self {
            table: PolicyTable::new(),
            encoder: StateEncoder::default(),
            selector: ActionSelector::default(),
            rule: LearningRule::default(),
            scored: AtomicU64::new(0),
            explored: AtomicU64::new(0),
            updates: 0,
            total_reward: 0.0,
        }
    }
}

/// One row of the policy, for inspection
#[derive(Debug, Clone, Serialize)]
pub struct PolicyEntry {
    pub state: State,
    pub values: ActionValues,
    pub greedy: Action,
}

/// Engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub states: usize,
    pub scored: u64,
    pub explored: u64,
    pub updates: u64,
    pub total_reward: f64,
    pub average_reward: f64,
    pub learning_rate: f64,
    pub epsilon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BucketBounds;
    use crate::state::PendingBucket;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine() -> PolicyEngine {
        PolicyEngine::new(&AgentConfig::default().with_learning_rate(0.5)).unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine = PolicyEngine::default();
        let stats = engine.stats();
        assert_eq!(stats.states, 0);
        assert_eq!(stats.learning_rate, 0.1);
        assert_eq!(stats.epsilon, 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AgentConfig::default().with_epsilon(2.0);
        assert!(matches!(
            PolicyEngine::new(&config),
            Err(CivicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_select_does_not_create_entries() {
        let engine = engine();
        let state = engine.encode("Pothole", "Ward 5", 3);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(engine.select(&state, &mut rng).action, Action::High);
        assert!(!engine.knows(&state));
        assert_eq!(engine.stats().scored, 1);
    }

    #[test]
    fn test_register_then_update() {
        let mut engine = engine();
        let state = engine.encode("Pothole", "Ward 5", 3);

        engine.register(&state);
        assert!(engine.knows(&state));
        assert_eq!(engine.values(&state), ActionValues::default());

        let update = engine.update(&state, Action::High, -5.0).unwrap();
        assert_eq!(update.current, -2.5);
        assert_eq!(engine.greedy(&state), Action::Medium);
    }

    #[test]
    fn test_stats_track_updates() {
        let mut engine = engine();
        let state = engine.encode("Garbage", "Ward 1", 10);

        engine.update(&state, Action::High, 10.0).unwrap();
        engine.update(&state, Action::Medium, 5.0).unwrap();
        engine.update(&state, Action::Low, -5.0).unwrap();

        let stats = engine.stats();
        assert_eq!(stats.states, 1);
        assert_eq!(stats.updates, 3);
        assert_eq!(stats.total_reward, 10.0);
        assert!((stats.average_reward - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_failed_update_leaves_stats() {
        let mut engine = engine();
        let state = engine.encode("Garbage", "Ward 1", 10);
        assert!(engine.update(&state, Action::High, f64::NAN).is_err());
        assert_eq!(engine.stats().updates, 0);
    }

    #[test]
    fn test_entries_report_greedy() {
        let mut engine = engine();
        let a = engine.encode("Pothole", "Ward 5", 0);
        let b = engine.encode("Streetlight", "Ward 2", 30);

        engine.update(&a, Action::Low, 10.0).unwrap();
        engine.register(&b);

        let entries = engine.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].state, a);
        assert_eq!(entries[0].greedy, Action::Low);
        assert_eq!(entries[1].greedy, Action::High);
    }

    #[test]
    fn test_parameter_changes_are_validated() {
        let mut engine = engine();
        assert!(engine.set_epsilon(0.3).is_ok());
        assert!(engine.set_epsilon(1.3).is_err());
        assert!(engine.set_learning_rate(0.2).is_ok());
        assert!(engine.set_learning_rate(0.0).is_err());

        let stats = engine.stats();
        assert_eq!(stats.epsilon, 0.3);
        assert_eq!(stats.learning_rate, 0.2);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut engine = engine();
        let state = engine.encode("Water Leak", "Ward 3", 7);
        engine.update(&state, Action::Medium, 5.0).unwrap();

        let snapshot = engine.snapshot();
        let mut fresh = PolicyEngine::default();
        assert_eq!(fresh.restore(&snapshot).unwrap(), 1);
        assert_eq!(fresh.values(&state).medium, 2.5);
    }

    #[test]
    fn test_restore_replaces_counters() {
        let mut source = engine();
        let state = source.encode("Pothole", "Ward 5", 3);
        source.update(&state, Action::High, 10.0).unwrap();
        let snapshot = source.snapshot();

        let mut target = engine();
        let other = target.encode("Garbage", "Ward 1", 0);
        for _ in 0..7 {
            target.update(&other, Action::Low, -5.0).unwrap();
        }

        target.restore(&snapshot).unwrap();
        let stats = target.stats();
        assert_eq!(stats.states, 1);
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.total_reward, 10.0);
        assert!(!target.knows(&other));
    }

    #[test]
    fn test_restore_rejects_duplicate_states() {
        let mut engine = engine();
        let kept = engine.encode("Streetlight", "Ward 2", 0);
        engine.update(&kept, Action::Medium, 5.0).unwrap();

        let mut snapshot = PolicyEngine::default().snapshot();
        let state = State::new("Pothole", "Ward 5", PendingBucket::Low);
        snapshot.entries = vec![
            SnapshotEntry::new(&state, ActionValues::new(1.0, 0.0, 0.0)),
            // Same state once labels are normalized
            SnapshotEntry {
                issue_type: " POTHOLE ".to_string(),
                area: "ward  5".to_string(),
                pending_bucket: PendingBucket::Low,
                values: ActionValues::new(-1.0, 0.0, 0.0),
            },
        ];

        assert!(matches!(
            engine.restore(&snapshot),
            Err(CivicError::Snapshot(_))
        ));
        // Failed restore leaves the table alone
        assert!(engine.knows(&kept));
        assert!(!engine.knows(&state));
        assert_eq!(engine.stats().updates, 1);
    }

    #[test]
    fn test_restore_with_different_bucket_bounds() {
        let mut wide = PolicyEngine::new(&AgentConfig {
            buckets: BucketBounds::new(10, 50),
            ..AgentConfig::default()
        })
        .unwrap();
        let state = wide.encode("Water Leak", "Ward 3", 8);
        assert_eq!(state.pending_bucket(), PendingBucket::Low);
        wide.update(&state, Action::High, 10.0).unwrap();
        let snapshot = wide.snapshot();
        assert_eq!(snapshot.buckets, BucketBounds::new(10, 50));

        let mut engine = engine();
        assert_eq!(engine.restore(&snapshot).unwrap(), 1);

        // Configured bounds stay in force; stored bucket labels are kept as is
        assert_eq!(engine.encoder().bounds(), BucketBounds::default());
        assert_eq!(
            engine.encode("Water Leak", "Ward 3", 8).pending_bucket(),
            PendingBucket::Medium
        );
        assert_eq!(engine.values(&state).high, 1.0);
    }

    #[test]
    fn test_reset() {
        let mut engine = engine();
        let state = engine.encode("Water Leak", "Ward 3", 7);
        engine.update(&state, Action::Medium, 5.0).unwrap();

        engine.reset();
        let stats = engine.stats();
        assert_eq!(stats.states, 0);
        assert_eq!(stats.updates, 0);
        assert_eq!(stats.total_reward, 0.0);
    }
}
