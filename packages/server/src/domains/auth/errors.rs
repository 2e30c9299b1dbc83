use thiserror::Error;

use crate::domains::registry::RegistryError;

/// Why code issuance was refused before any SMS cost was incurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// Request exists but an admin has not approved it yet
    Waiting,
    /// Request exists but was rejected or revoked
    Inactive,
    /// No request for this (phone, role) at all
    NotFound,
}

/// Authentication errors for the Basecamp platform
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authorized for this role: {0:?}")]
    NotAuthorized(DenialReason),

    #[error("Verification code could not be delivered")]
    DeliveryFailed,

    #[error("Verification code expired")]
    Expired,

    #[error("Verification code does not match")]
    Mismatched,

    #[error("No verification in progress")]
    NoSession,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
