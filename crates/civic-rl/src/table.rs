//! Policy table: state -> per-priority value estimates

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::state::{Action, State};

/// Value estimate for each priority in one state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionValues {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl ActionValues {
    pub fn new(high: f64, medium: f64, low: f64) -> Self {
        Self { high, medium, low }
    }

    pub fn get(&self, action: Action) -> f64 {
        match action {
            Action::High => self.high,
            Action::Medium => self.medium,
            Action::Low => self.low,
        }
    }

    pub fn get_mut(&mut self, action: Action) -> &mut f64 {
        match action {
            Action::High => &mut self.high,
            Action::Medium => &mut self.medium,
            Action::Low => &mut self.low,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.high.is_finite() && self.medium.is_finite() && self.low.is_finite()
    }
}

/// Tabular policy.
///
/// Entries appear lazily with all values at zero and are never removed.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    entries: HashMap<State, ActionValues>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values for `state`; an unseen state reads as all zeros
    pub fn get(&self, state: &State) -> ActionValues {
        self.entries.get(state).copied().unwrap_or_default()
    }

    pub fn contains(&self, state: &State) -> bool {
        self.entries.contains_key(state)
    }

    /// Mutable values for `state`, creating the entry on first access
    pub fn entry_mut(&mut self, state: &State) -> &mut ActionValues {
        self.entries.entry(state.clone()).or_default()
    }

    pub fn insert(&mut self, state: State, values: ActionValues) {
        self.entries.insert(state, values);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by state, for stable display and snapshots
    pub fn sorted(&self) -> Vec<(&State, &ActionValues)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
