//! Auth domain data types.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domains::registry::AccessRole;

/// The authenticated identity handed to downstream features after a
/// successful verification. Identity is the normalized phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub phone_number: String,
    pub role: AccessRole,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == AccessRole::Administrator
    }
}

/// Generate a 6-digit verification code, each digit drawn independently
/// and uniformly. Codes are not unique across users; only unpredictable
/// within the validity window.
pub fn generate_verification_code() -> String {
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| char::from(b'0' + rng.gen_range(0u8..10)))
        .collect()
}
