//! Access-control domain - admin-managed status transitions.
//!
//! Admins flip the status of access requests (대기/활성/비활성). Every flip
//! is audited; flips that grant or revoke active access notify the
//! affected phone by SMS.

pub mod models;
pub mod workflow;

pub use models::{AccessChangeRecord, CommitOutcome, StatusEdit};
pub use workflow::{AccessControlWorkflow, AccessError};
