//! Durable copy of the policy table
//!
//! The table itself lives in memory. A snapshot is a JSON document holding
//! every state's values so a restart can pick up where learning left off.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use civic_core::{CivicError, Result};

use crate::config::BucketBounds;
use crate::state::{PendingBucket, State};
use crate::table::ActionValues;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized policy table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub learning_rate: f64,
    pub epsilon: f64,
    pub buckets: BucketBounds,
    /// Absent in snapshots written before counters were recorded
    #[serde(default)]
    pub counters: PolicyCounters,
    pub entries: Vec<SnapshotEntry>,
}

/// Lifetime activity counters carried across restarts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyCounters {
    pub scored: u64,
    pub explored: u64,
    pub updates: u64,
    pub total_reward: f64,
}

/// One state's values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub issue_type: String,
    pub area: String,
    pub pending_bucket: PendingBucket,
    pub values: ActionValues,
}

impl SnapshotEntry {
    pub fn new(state: &State, values: ActionValues) -> Self {
        Self {
            issue_type: state.issue_type().to_string(),
            area: state.area().to_string(),
            pending_bucket: state.pending_bucket(),
            values,
        }
    }

    /// Rebuild the state; labels are normalized again in case the file was hand-edited
    pub fn state(&self) -> State {
        State::new(&self.issue_type, &self.area, self.pending_bucket)
    }
}

impl PolicySnapshot {
    pub fn new(
        learning_rate: f64,
        epsilon: f64,
        buckets: BucketBounds,
        counters: PolicyCounters,
        entries: Vec<SnapshotEntry>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            learning_rate,
            epsilon,
            buckets,
            counters,
            entries,
        }
    }

    /// Reject unknown versions and non-finite values
    pub fn validate(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(CivicError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if !self.counters.total_reward.is_finite() {
            return Err(CivicError::Snapshot(
                "non-finite total_reward in counters".to_string(),
            ));
        }
        if let Some(bad) = self.entries.iter().find(|e| !e.values.is_finite()) {
            return Err(CivicError::Snapshot(format!(
                "non-finite value for state {}",
                bad.state()
            )));
        }
        Ok(())
    }

    /// Write to `path` via a uniquely named temporary sibling and rename.
    ///
    /// Concurrent saves to the same path each use their own temp file; the
    /// last rename wins and readers never see a partial document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let json = serde_json::to_vec_pretty(self)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".policy-")
            .suffix(".json.tmp")
            .tempfile_in(parent)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        info!("Saved {} policy entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let snapshot: Self = serde_json::from_slice(&bytes)?;
        snapshot.validate()?;

        info!(
            "Loaded {} policy entries from {} (saved {})",
            snapshot.entries.len(),
            path.display(),
            snapshot.saved_at
        );
        Ok(snapshot)
    }
}
