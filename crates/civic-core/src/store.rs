//! Request persistence contract
//!
//! The intake workflow talks to storage only through [`RequestStore`]. The
//! in-memory implementation backs tests, the simulator, and single-process
//! deployments; database backends implement the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CivicError, Result};
use crate::request::{RequestId, RequestStatus, ServiceRequest};

/// Storage operations the intake workflow depends on
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert a new request record
    async fn insert(&self, request: ServiceRequest) -> Result<()>;

    /// Fetch a single request
    async fn get(&self, id: RequestId) -> Result<Option<ServiceRequest>>;

    /// All requests, newest first
    async fn list(&self) -> Result<Vec<ServiceRequest>>;

    /// Requests submitted from one mobile number, newest first
    async fn list_by_mobile(&self, mobile: &str) -> Result<Vec<ServiceRequest>>;

    /// Set the status of an existing request, returning the updated record
    async fn update_status(&self, id: RequestId, status: RequestStatus) -> Result<ServiceRequest>;

    /// Number of requests currently in `status`
    async fn count_by_status(&self, status: &RequestStatus) -> Result<usize>;
}

/// In-memory request store
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<RequestId, ServiceRequest>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(mut requests: Vec<ServiceRequest>) -> Vec<ServiceRequest> {
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn insert(&self, request: ServiceRequest) -> Result<()> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id) {
            return Err(CivicError::Store(format!(
                "request {} already exists",
                request.id
            )));
        }
        debug!("Storing request {} ({})", request.id, request.issue_type);
        requests.insert(request.id, request);
        Ok(())
    }

    async fn get(&self, id: RequestId) -> Result<Option<ServiceRequest>> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<ServiceRequest>> {
        let requests = self.requests.read().await;
        Ok(Self::newest_first(requests.values().cloned().collect()))
    }

    async fn list_by_mobile(&self, mobile: &str) -> Result<Vec<ServiceRequest>> {
        let requests = self.requests.read().await;
        Ok(Self::newest_first(
            requests
                .values()
                .filter(|r| r.mobile == mobile)
                .cloned()
                .collect(),
        ))
    }

    async fn update_status(&self, id: RequestId, status: RequestStatus) -> Result<ServiceRequest> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(&id)
            .ok_or_else(|| CivicError::NotFound(format!("request {id}")))?;
        request.set_status(status);
        Ok(request.clone())
    }

    async fn count_by_status(&self, status: &RequestStatus) -> Result<usize> {
        let requests = self.requests.read().await;
        Ok(requests.values().filter(|r| &r.status == status).count())
    }
}
