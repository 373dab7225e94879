//! Civic RL - Priority assignment learned from administrator decisions
//!
//! A single-step contextual bandit: each new service request is encoded into
//! a discrete state, a priority is chosen from a tabular value estimate, and
//! the estimate is later pulled toward the reward implied by how the
//! administrator resolved the request.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod config;
pub mod engine;
pub mod learning;
pub mod reward;
pub mod selector;
pub mod snapshot;
pub mod state;
pub mod table;

pub use agent::PriorityAgent;
pub use config::{AgentConfig, BucketBounds};
pub use engine::{EngineStats, PolicyEngine, PolicyEntry};
pub use learning::{LearningRule, ValueUpdate};
pub use reward::{reward_for, Outcome};
pub use selector::{ActionSelector, Selection};
pub use snapshot::{PolicyCounters, PolicySnapshot};
pub use state::{Action, PendingBucket, Reward, State, StateEncoder};
pub use table::{ActionValues, PolicyTable};
