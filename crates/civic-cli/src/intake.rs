//! Intake workflow - the two places the web layer calls into the agent
//!
//! Submission counts the pending queue, asks the agent for a priority, and
//! stores the request. Resolution re-counts the queue, feeds the decision
//! back to the agent, and then updates the status. Neither path is ever
//! blocked by the agent: scoring cannot fail, and a failed learning step is
//! logged and skipped.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use civic_core::{
    CivicError, NewServiceRequest, RequestId, RequestStatus, RequestStore, Result, ServiceRequest,
};
use civic_rl::PriorityAgent;

/// Request intake backed by a store and a shared agent
pub struct IntakeService {
    store: Arc<dyn RequestStore>,
    agent: Arc<PriorityAgent>,
    autosave_path: Option<PathBuf>,
}

impl IntakeService {
    pub fn new(store: Arc<dyn RequestStore>, agent: Arc<PriorityAgent>) -> Self {
        Self {
            store,
            agent,
            autosave_path: None,
        }
    }

    /// Save the policy snapshot to `path` after every resolution
    pub fn with_autosave(mut self, path: PathBuf) -> Self {
        self.autosave_path = Some(path);
        self
    }

    pub fn agent(&self) -> &Arc<PriorityAgent> {
        &self.agent
    }

    pub async fn pending_count(&self) -> Result<u64> {
        let count = self.store.count_by_status(&RequestStatus::Pending).await?;
        Ok(count as u64)
    }

    /// Score and store a new request
    pub async fn submit(&self, request: NewServiceRequest) -> Result<ServiceRequest> {
        let pending = self.pending_count().await?;
        let priority =
            self.agent
                .score_new_request(request.effective_issue_type(), &request.area, pending);

        let record = ServiceRequest::pending(request, priority);
        self.store.insert(record.clone()).await?;

        info!(
            "Request {} ({} in {}) submitted with {} priority, {} pending",
            record.id, record.issue_type, record.area, priority, pending
        );
        Ok(record)
    }

    /// Apply an administrator decision and learn from it
    pub async fn resolve(&self, id: RequestId, status: RequestStatus) -> Result<ServiceRequest> {
        let request = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| CivicError::NotFound(format!("request {id}")))?;

        // Queue size now, not at submission time
        let pending = self.pending_count().await?;

        if let Err(e) = self.agent.learn_from_resolution(
            &request.issue_type,
            &request.area,
            pending,
            request.priority,
            &status,
        ) {
            warn!("Agent could not learn from request {}: {}", id, e);
        }

        let updated = self.store.update_status(id, status).await?;
        info!("Request {} marked {}", id, updated.status);

        if let Some(path) = &self.autosave_path {
            self.autosave(path.clone()).await;
        }

        Ok(updated)
    }

    /// Write the snapshot on the blocking pool; failures are logged only
    async fn autosave(&self, path: PathBuf) {
        let agent = Arc::clone(&self.agent);
        let result = tokio::task::spawn_blocking(move || {
            let saved = agent.save_to(&path);
            (path, saved)
        })
        .await;

        match result {
            Ok((_, Ok(()))) => {}
            Ok((path, Err(e))) => {
                warn!("Failed to save policy snapshot to {}: {}", path.display(), e);
            }
            Err(e) => warn!("Policy snapshot task failed: {}", e),
        }
    }

    /// All requests, newest first
    pub async fn list(&self) -> Result<Vec<ServiceRequest>> {
        self.store.list().await
    }

    /// A citizen's own requests, newest first
    pub async fn list_for_mobile(&self, mobile: &str) -> Result<Vec<ServiceRequest>> {
        self.store.list_by_mobile(mobile).await
    }
}
