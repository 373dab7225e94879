//! Incremental-mean learning update

use civic_core::{CivicError, Result};

use crate::config::validate_learning_rate;
use crate::state::{Action, Reward, State};
use crate::table::PolicyTable;

/// Before/after values of one applied update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueUpdate {
    pub previous: f64,
    pub current: f64,
}

/// `new = old + α·(reward − old)`
#[derive(Debug, Clone, Copy)]
pub struct LearningRule {
    alpha: f64,
}

impl LearningRule {
    pub fn new(alpha: f64) -> Result<Self> {
        validate_learning_rate(alpha)?;
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// One step from `old` toward `reward`.
    ///
    /// The result always lies between `old` and `reward` inclusive, so a
    /// repeated reward is approached but never overshot.
    pub fn step(&self, old: f64, reward: Reward) -> f64 {
        let next = old + self.alpha * (reward - old);
        next.clamp(old.min(reward), old.max(reward))
    }

    /// Apply `reward` to `(state, action)`, creating the entry if needed
    pub fn apply(
        &self,
        table: &mut PolicyTable,
        state: &State,
        action: Action,
        reward: Reward,
    ) -> Result<ValueUpdate> {
        if !reward.is_finite() {
            return Err(CivicError::InvalidReward(reward));
        }
        let slot = table.entry_mut(state).get_mut(action);
        let previous = *slot;
        let current = self.step(previous, reward);
        *slot = current;
        Ok(ValueUpdate { previous, current })
    }
}

impl Default for LearningRule {
    fn default() -> Self {
        Self { alpha: 0.1 }
    }
}
