//! Civic Core - Request types, errors, and the persistence contract
//!
//! This crate provides the foundational types shared by the priority agent
//! and the intake workflow.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod request;
pub mod store;
pub mod util;

pub use error::{CivicError, Result};
pub use request::{NewServiceRequest, Priority, RequestId, RequestStatus, ServiceRequest};
pub use store::{InMemoryRequestStore, RequestStore};
