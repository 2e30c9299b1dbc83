//! Registry domain - the authoritative table of who may authenticate
//! and with which role.
//!
//! Responsibilities:
//! - Status lookup by normalized phone number and requested role
//! - Append-only audit / usage / SMS / login log writes
//! - Diff-based partial write-back of admin status edits

pub mod client;
pub mod models;
pub mod tables;

pub use client::{RegistryClient, RegistryError};
pub use models::{format_phone_number, AccessRole, RegistryEntry, RegistryStatus};
