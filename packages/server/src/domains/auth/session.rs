//! Session context store.
//!
//! After OTP verification a bearer token is minted and mapped to the
//! verified principal. Process-memory only: a restart logs everyone out
//! and forces re-authentication.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::Principal;

/// Session token (random UUID)
pub type SessionToken = String;

/// Session data stored after successful OTP verification
#[derive(Clone, Debug)]
pub struct LoginSession {
    pub principal: Principal,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// In-memory session store
///
/// Sessions expire after 24 hours
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, LoginSession>>>,
}

const SESSION_TTL_HOURS: i64 = 24;

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new session and return the token.
    ///
    /// Expired sessions are reaped here, under the write lock already
    /// being taken; the map stays bounded by the number of logins per
    /// TTL without a background task.
    pub async fn create_session(&self, principal: Principal) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        let now = chrono::Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| {
            now.signed_duration_since(session.created_at).num_hours() < SESSION_TTL_HOURS
        });
        sessions.insert(
            token.clone(),
            LoginSession {
                principal,
                created_at: now,
            },
        );
        token
    }

    /// Get session by token
    pub async fn get_session(&self, token: &str) -> Option<LoginSession> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(token)?;

        let elapsed = chrono::Utc::now().signed_duration_since(session.created_at);
        if elapsed.num_hours() >= SESSION_TTL_HOURS {
            return None;
        }

        Some(session.clone())
    }

    /// Delete session (logout)
    pub async fn delete_session(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
