//! Auth domain - phone-number authentication with one-time SMS codes.
//!
//! Responsibilities:
//! - Per-(phone, role) OTP session state machine: issue, resend, verify,
//!   cancel, 30-second validity window
//! - Minting the session context (bearer token → principal) on success
//! - Login logging

pub mod errors;
pub mod models;
pub mod otp;
pub mod session;

pub use errors::{AuthError, DenialReason};
pub use models::{generate_verification_code, Principal};
pub use otp::OtpSessionManager;
pub use session::{LoginSession, SessionStore};
