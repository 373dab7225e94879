//! Mapping from resolution outcome to reward

use civic_core::RequestStatus;

use crate::state::{Action, Reward};

pub const APPROVED_HIGH_REWARD: Reward = 10.0;
pub const APPROVED_MEDIUM_REWARD: Reward = 5.0;
pub const REJECTED_REWARD: Reward = -5.0;
pub const NEUTRAL_REWARD: Reward = 0.0;

/// Administrator decision as seen by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Approved,
    Rejected,
    /// Any other status, including Pending
    Other,
}

impl From<&RequestStatus> for Outcome {
    fn from(status: &RequestStatus) -> Self {
        match status {
            RequestStatus::Approved => Outcome::Approved,
            RequestStatus::Rejected => Outcome::Rejected,
            RequestStatus::Pending | RequestStatus::Other(_) => Outcome::Other,
        }
    }
}

impl From<&str> for Outcome {
    fn from(status: &str) -> Self {
        Outcome::from(&RequestStatus::from(status))
    }
}

/// Reward for resolving a request that was assigned `priority`.
///
/// Approved+High > Approved+Medium > anything unobserved > Rejected.
pub fn reward_for(outcome: Outcome, priority: Action) -> Reward {
    match (outcome, priority) {
        (Outcome::Approved, Action::High) => APPROVED_HIGH_REWARD,
        (Outcome::Approved, Action::Medium) => APPROVED_MEDIUM_REWARD,
        (Outcome::Rejected, _) => REJECTED_REWARD,
        _ => NEUTRAL_REWARD,
    }
}
