//! Error types for civic intake

use thiserror::Error;

/// Main error type for civic intake
#[derive(Error, Debug)]
pub enum CivicError {
    /// Priority outside the closed `{High, Medium, Low}` set
    #[error("Invalid action: {0:?} is not one of High, Medium, Low")]
    InvalidAction(String),

    #[error("Invalid reward: {0} is not a finite number")]
    InvalidReward(f64),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for civic intake operations
pub type Result<T> = std::result::Result<T, CivicError>;
