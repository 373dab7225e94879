//! State, Action, and Reward types for the priority agent

use std::fmt;

use serde::{Deserialize, Serialize};

use civic_core::Priority;

use crate::config::BucketBounds;

/// The agent's action space is the request priority
pub type Action = Priority;

/// Reward value from a resolution outcome
pub type Reward = f64;

/// Label used when an issue type or area is blank after normalization
pub const UNSPECIFIED: &str = "unspecified";

/// Discretized size of the pending queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingBucket {
    Low,
    Medium,
    High,
}

impl PendingBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            PendingBucket::Low => "low",
            PendingBucket::Medium => "medium",
            PendingBucket::High => "high",
        }
    }
}

impl fmt::Display for PendingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BucketBounds {
    /// Band for a pending count; monotone non-decreasing in `pending`
    pub fn bucket(&self, pending: u64) -> PendingBucket {
        if pending < self.low_below {
            PendingBucket::Low
        } else if pending > self.high_above {
            PendingBucket::High
        } else {
            PendingBucket::Medium
        }
    }
}

/// Discrete state used to index the policy table.
///
/// Labels are always stored normalized, so two states built from the same
/// issue type and area compare equal regardless of case or spacing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct State {
    issue_type: String,
    area: String,
    pending_bucket: PendingBucket,
}

impl State {
    pub fn new(issue_type: &str, area: &str, pending_bucket: PendingBucket) -> Self {
        Self {
            issue_type: normalize_label(issue_type),
            area: normalize_label(area),
            pending_bucket,
        }
    }

    pub fn issue_type(&self) -> &str {
        &self.issue_type
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn pending_bucket(&self) -> PendingBucket {
        self.pending_bucket
    }

    /// Stable textual key, e.g. `pothole|ward 5|low`
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.issue_type, self.area, self.pending_bucket)
    }
}

/// Trim, collapse inner whitespace, and case-fold a free-text label.
///
/// Blank input maps to [`UNSPECIFIED`] rather than failing: intake text is
/// free-form and must never block a submission.
pub fn normalize_label(raw: &str) -> String {
    let folded = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if folded.is_empty() {
        UNSPECIFIED.to_string()
    } else {
        folded
    }
}

/// Maps raw request context to a [`State`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StateEncoder {
    bounds: BucketBounds,
}

impl StateEncoder {
    pub fn new(bounds: BucketBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> BucketBounds {
        self.bounds
    }

    pub fn encode(&self, issue_type: &str, area: &str, pending_count: u64) -> State {
        State::new(issue_type, area, self.bounds.bucket(pending_count))
    }
}
