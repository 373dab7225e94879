//! Priority Agent - the two call sites used by the intake workflow
//!
//! `score_new_request` runs when a citizen submits a request;
//! `learn_from_resolution` runs later, when the administrator approves or
//! rejects it. Both may be called concurrently from any number of handlers.
//!
//! The engine sits behind a single `RwLock`: scoring takes the read lock
//! (the write lock only the first time a state is seen, to create its
//! entry), and every update takes the write lock so a read-modify-write of
//! an estimate can never interleave with another.
//!
//! # Re-sampled state at resolution time
//!
//! The pending count passed to `learn_from_resolution` is the queue size *at
//! resolution time*, not the one observed at submission. The reward is
//! credited to the state the queue is in now, which can fall into a
//! different bucket than the one the priority was chosen under. Callers
//! wanting submission-time credit must pass the submission-time count.

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::Rng;
use tracing::{debug, warn};

use civic_core::{CivicError, Priority, RequestStatus, Result};

use crate::config::AgentConfig;
use crate::engine::{EngineStats, PolicyEngine, PolicyEntry};
use crate::reward::{reward_for, Outcome};
use crate::snapshot::PolicySnapshot;
use crate::state::{Action, Reward, State};
use crate::table::ActionValues;

/// Priority returned when the agent cannot consult its policy
pub const FALLBACK_PRIORITY: Priority = Priority::Medium;

/// Thread-safe priority assignment agent
pub struct PriorityAgent {
    engine: RwLock<PolicyEngine>,
}

impl PriorityAgent {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        Ok(Self {
            engine: RwLock::new(PolicyEngine::new(config)?),
        })
    }

    /// Create an agent and seed its table from a snapshot file
    pub fn load_from(config: &AgentConfig, path: &Path) -> Result<Self> {
        let agent = Self::new(config)?;
        agent.restore(&PolicySnapshot::load(path)?)?;
        Ok(agent)
    }

    fn read(&self) -> Option<RwLockReadGuard<'_, PolicyEngine>> {
        match self.engine.read() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!("Policy lock poisoned; falling back to {}", FALLBACK_PRIORITY);
                None
            }
        }
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, PolicyEngine>> {
        self.engine
            .write()
            .map_err(|_| CivicError::Internal("policy lock poisoned".to_string()))
    }

    /// Encode request context into a state
    pub fn encode(&self, issue_type: &str, area: &str, pending_count: u64) -> State {
        match self.engine.read() {
            Ok(engine) => engine.encode(issue_type, area, pending_count),
            Err(poisoned) => poisoned.get_ref().encode(issue_type, area, pending_count),
        }
    }

    /// Assign a priority to a newly submitted request
    pub fn score_new_request(&self, issue_type: &str, area: &str, pending_count: u64) -> Priority {
        self.score_with_rng(issue_type, area, pending_count, &mut rand::thread_rng())
    }

    /// [`Self::score_new_request`] with a caller-supplied random source
    pub fn score_with_rng<R: Rng + ?Sized>(
        &self,
        issue_type: &str,
        area: &str,
        pending_count: u64,
        rng: &mut R,
    ) -> Priority {
        let state = {
            let Some(engine) = self.read() else {
                return FALLBACK_PRIORITY;
            };
            let state = engine.encode(issue_type, area, pending_count);
            if engine.knows(&state) {
                return engine.select(&state, rng).action;
            }
            state
        };

        match self.write() {
            Ok(mut engine) => {
                engine.register(&state);
                engine.select(&state, rng).action
            }
            Err(e) => {
                warn!("Cannot register state {}: {}; using {}", state, e, FALLBACK_PRIORITY);
                FALLBACK_PRIORITY
            }
        }
    }

    /// Learn from an administrator's decision on a request.
    ///
    /// `pending_count` is re-sampled at resolution time; see the module docs.
    pub fn learn_from_resolution(
        &self,
        issue_type: &str,
        area: &str,
        pending_count: u64,
        assigned: Priority,
        status: &RequestStatus,
    ) -> Result<()> {
        let outcome = Outcome::from(status);
        let reward = reward_for(outcome, assigned);

        let mut engine = self.write()?;
        let state = engine.encode(issue_type, area, pending_count);
        engine.update(&state, assigned, reward)?;

        debug!(
            "Learned from {} resolution of {} priority in {} (reward {})",
            status, assigned, state, reward
        );
        Ok(())
    }

    /// [`Self::learn_from_resolution`] for values read back as text.
    ///
    /// An `assigned` value outside High/Medium/Low fails with `InvalidAction`.
    pub fn learn_from_stored(
        &self,
        issue_type: &str,
        area: &str,
        pending_count: u64,
        assigned: &str,
        status: &str,
    ) -> Result<()> {
        let assigned: Priority = assigned.parse()?;
        self.learn_from_resolution(
            issue_type,
            area,
            pending_count,
            assigned,
            &RequestStatus::from(status),
        )
    }

    /// Apply a reward directly to `(state, action)`
    pub fn update(&self, state: &State, action: Action, reward: Reward) -> Result<()> {
        self.write()?.update(state, action, reward)?;
        Ok(())
    }

    /// Current estimates for `state`
    pub fn values(&self, state: &State) -> ActionValues {
        self.read().map(|e| e.values(state)).unwrap_or_default()
    }

    pub fn policy(&self) -> Vec<PolicyEntry> {
        self.read().map(|e| e.entries()).unwrap_or_default()
    }

    pub fn stats(&self) -> Result<EngineStats> {
        Ok(self
            .engine
            .read()
            .map_err(|_| CivicError::Internal("policy lock poisoned".to_string()))?
            .stats())
    }

    pub fn set_epsilon(&self, epsilon: f64) -> Result<()> {
        self.write()?.set_epsilon(epsilon)
    }

    pub fn set_learning_rate(&self, learning_rate: f64) -> Result<()> {
        self.write()?.set_learning_rate(learning_rate)
    }

    pub fn snapshot(&self) -> Result<PolicySnapshot> {
        Ok(self
            .engine
            .read()
            .map_err(|_| CivicError::Internal("policy lock poisoned".to_string()))?
            .snapshot())
    }

    pub fn restore(&self, snapshot: &PolicySnapshot) -> Result<usize> {
        self.write()?.restore(snapshot)
    }

    /// Snapshot the table and write it to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Serialize outside the lock
        let snapshot = self.snapshot()?;
        snapshot.save(path)
    }

    pub fn reset(&self) -> Result<()> {
        self.write()?.reset();
        Ok(())
    }
}

impl Default for PriorityAgent {
    fn default() -> Self {
        Self {
            engine: RwLock::new(PolicyEngine::default()),
        }
    }
}
