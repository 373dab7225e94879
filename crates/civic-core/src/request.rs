//! Service request types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CivicError;

/// Unique identifier for a service request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority assigned to a request.
///
/// This is a closed set: anything that does not parse into one of the three
/// variants is an `InvalidAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl Priority {
    /// All priorities, highest first
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(CivicError::InvalidAction(s.to_string())),
        }
    }
}

/// Request status as set by the administrator.
///
/// Statuses outside the known three are kept verbatim so that the store
/// never loses what the front end submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Other(String),
}

impl RequestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Other(s) => s,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatus::Pending)
    }
}

impl From<&str> for RequestStatus {
    fn from(s: &str) -> Self {
        match s.trim() {
            "Pending" => RequestStatus::Pending,
            "Approved" => RequestStatus::Approved,
            "Rejected" => RequestStatus::Rejected,
            other => RequestStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for RequestStatus {
    fn from(s: String) -> Self {
        RequestStatus::from(s.as_str())
    }
}

impl From<RequestStatus> for String {
    fn from(status: RequestStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue type selector value that asks for a free-text description instead
pub const OTHER_ISSUE: &str = "Other";

/// A submission as it arrives from the intake form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub citizen_name: String,
    pub mobile: String,
    pub issue_type: String,
    /// Free-text issue, used when `issue_type` is "Other"
    pub other_issue: Option<String>,
    pub area: String,
    pub address: String,
    pub description: String,
}

impl NewServiceRequest {
    pub fn new(
        citizen_name: impl Into<String>,
        mobile: impl Into<String>,
        issue_type: impl Into<String>,
        area: impl Into<String>,
    ) -> Self {
        Self {
            citizen_name: citizen_name.into(),
            mobile: mobile.into(),
            issue_type: issue_type.into(),
            area: area.into(),
            ..Self::default()
        }
    }

    pub fn with_other_issue(mut self, other: impl Into<String>) -> Self {
        self.other_issue = Some(other.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Issue type to record: the free-text issue replaces "Other" when given
    pub fn effective_issue_type(&self) -> &str {
        if self.issue_type.trim() == OTHER_ISSUE {
            if let Some(other) = self.other_issue.as_deref() {
                if !other.trim().is_empty() {
                    return other.trim();
                }
            }
        }
        &self.issue_type
    }
}

/// A stored service request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: RequestId,
    pub citizen_name: String,
    pub mobile: String,
    pub issue_type: String,
    pub area: String,
    pub address: String,
    pub description: String,
    pub status: RequestStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// Build a pending record from a submission and its assigned priority
    pub fn pending(new: NewServiceRequest, priority: Priority) -> Self {
        let now = Utc::now();
        let issue_type = new.effective_issue_type().to_string();
        Self {
            id: RequestId::new(),
            citizen_name: new.citizen_name,
            mobile: new.mobile,
            issue_type,
            area: new.area,
            address: new.address,
            description: new.description,
            status: RequestStatus::Pending,
            priority,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status: RequestStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
