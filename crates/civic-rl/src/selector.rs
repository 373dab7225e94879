//! Action selection (greedy with optional epsilon exploration)

use rand::seq::SliceRandom;
use rand::Rng;

use crate::state::Action;
use crate::table::ActionValues;

/// Outcome of one selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub action: Action,
    /// True when the action was drawn at random instead of taken greedily
    pub explored: bool,
}

/// Epsilon-greedy selector with an explicit tie-break order
#[derive(Debug, Clone)]
pub struct ActionSelector {
    epsilon: f64,
    tie_break: [Action; 3],
}

impl ActionSelector {
    /// `epsilon` must already be validated to lie in [0, 1]
    pub fn new(epsilon: f64, tie_break: [Action; 3]) -> Self {
        Self { epsilon, tie_break }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn tie_break(&self) -> [Action; 3] {
        self.tie_break
    }

    /// Highest-valued action; among equal values the earliest in the tie-break order wins
    pub fn greedy(&self, values: &ActionValues) -> Action {
        let mut best = self.tie_break[0];
        let mut best_value = values.get(best);
        for &candidate in &self.tie_break[1..] {
            let value = values.get(candidate);
            if value > best_value {
                best = candidate;
                best_value = value;
            }
        }
        best
    }

    pub fn select<R: Rng + ?Sized>(&self, values: &ActionValues, rng: &mut R) -> Selection {
        if self.epsilon > 0.0 && rng.gen::<f64>() < self.epsilon {
            if let Some(&action) = Action::ALL.choose(rng) {
                return Selection {
                    action,
                    explored: true,
                };
            }
        }
        Selection {
            action: self.greedy(values),
            explored: false,
        }
    }
}

impl Default for ActionSelector {
    fn default() -> Self {
        Self::new(0.0, Action::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_untrained_state_prefers_high() {
        let selector = ActionSelector::default();
        assert_eq!(selector.greedy(&ActionValues::default()), Action::High);
    }

    #[test]
    fn test_greedy_picks_maximum() {
        let selector = ActionSelector::default();
        assert_eq!(
            selector.greedy(&ActionValues::new(-5.0, 0.0, -1.0)),
            Action::Medium
        );
        assert_eq!(selector.greedy(&ActionValues::new(1.0, 2.0, 3.0)), Action::Low);
    }

    #[test]
    fn test_partial_tie_uses_order() {
        let selector = ActionSelector::default();
        // Medium and Low tie above High; Medium comes first
        assert_eq!(
            selector.greedy(&ActionValues::new(-1.0, 4.0, 4.0)),
            Action::Medium
        );
    }

    #[test]
    fn test_custom_tie_break() {
        let selector = ActionSelector::new(0.0, [Action::Medium, Action::Low, Action::High]);
        assert_eq!(selector.greedy(&ActionValues::default()), Action::Medium);
    }

    #[test]
    fn test_zero_epsilon_never_explores() {
        let selector = ActionSelector::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let selection = selector.select(&ActionValues::new(0.0, 1.0, 0.0), &mut rng);
            assert_eq!(selection.action, Action::Medium);
            assert!(!selection.explored);
        }
    }

    #[test]
    fn test_full_epsilon_explores_all_actions() {
        let selector = ActionSelector::new(1.0, Action::ALL);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            let selection = selector.select(&ActionValues::default(), &mut rng);
            assert!(selection.explored);
            seen.insert(selection.action);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_set_epsilon() {
        let mut selector = ActionSelector::default();
        selector.set_epsilon(0.25);
        assert_eq!(selector.epsilon(), 0.25);
        assert_eq!(selector.tie_break(), Action::ALL);
    }
}
