//! OTP session manager - the per-login-attempt state machine.
//!
//! One session per (phone, role), held in process memory only. A session
//! is created on issue, replaced whole on resend, destroyed on successful
//! verification or cancel, and refused after the 30-second window.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::errors::{AuthError, DenialReason};
use super::models::{generate_verification_code, Principal};
use crate::domains::registry::{format_phone_number, AccessRole, RegistryClient, RegistryStatus};
use crate::kernel::BaseSmsService;

/// How long an issued code is accepted
pub const OTP_VALIDITY_SECONDS: i64 = 30;

/// Sessions older than this are abandoned login attempts and are reaped
/// the next time any code is dispatched. Deliberately much longer than
/// the validity window: an expired-but-recent session must survive so a
/// resend still works.
const SESSION_ABANDON_SECONDS: i64 = 600;

const SMS_LABEL_VERIFICATION: &str = "인증번호";

/// One in-progress login attempt
#[derive(Debug, Clone)]
struct OtpSession {
    code: String,
    issued_at: DateTime<Utc>,
    attempts_consumed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    phone_number: String,
    role: AccessRole,
}

pub struct OtpSessionManager {
    registry: Arc<RegistryClient>,
    sms: Arc<dyn BaseSmsService>,
    sessions: RwLock<HashMap<SessionKey, OtpSession>>,
}

impl OtpSessionManager {
    pub fn new(registry: Arc<RegistryClient>, sms: Arc<dyn BaseSmsService>) -> Self {
        Self {
            registry,
            sms,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a verification code for (phone, role).
    ///
    /// Requires an Active registry entry; otherwise no code is generated
    /// and no SMS cost is incurred. On success the code is dispatched and
    /// a new session replaces any prior one.
    pub async fn issue_code(&self, phone_number: &str, role: AccessRole) -> Result<(), AuthError> {
        let phone = format_phone_number(phone_number);

        match self.registry.lookup_status(&phone, role).await? {
            Some(RegistryStatus::Active) => {}
            Some(RegistryStatus::Waiting) => {
                return Err(AuthError::NotAuthorized(DenialReason::Waiting))
            }
            Some(RegistryStatus::Inactive) => {
                return Err(AuthError::NotAuthorized(DenialReason::Inactive))
            }
            None => return Err(AuthError::NotAuthorized(DenialReason::NotFound)),
        }

        self.dispatch_code(&phone, role).await
    }

    /// Re-issue a code for an in-progress login attempt.
    ///
    /// Authorization is not re-checked; the prior issue_code established it.
    /// The new code fully supersedes the old one before this returns, so a
    /// verification racing a resend only ever checks the latest code.
    pub async fn resend_code(&self, phone_number: &str, role: AccessRole) -> Result<(), AuthError> {
        let phone = format_phone_number(phone_number);
        let key = SessionKey {
            phone_number: phone.clone(),
            role,
        };

        if !self.sessions.read().await.contains_key(&key) {
            return Err(AuthError::NoSession);
        }

        self.dispatch_code(&phone, role).await
    }

    /// Check a submitted code. On success the session is destroyed and the
    /// verified principal is returned; a second call cannot succeed.
    pub async fn verify_code(
        &self,
        phone_number: &str,
        role: AccessRole,
        submitted: &str,
    ) -> Result<Principal, AuthError> {
        let phone = format_phone_number(phone_number);
        let key = SessionKey {
            phone_number: phone.clone(),
            role,
        };

        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&key).ok_or(AuthError::NoSession)?;

        let elapsed = Utc::now().signed_duration_since(session.issued_at);
        if elapsed > Duration::seconds(OTP_VALIDITY_SECONDS) {
            // Terminal for this code; the session stays so a resend works
            return Err(AuthError::Expired);
        }

        if submitted != session.code {
            session.attempts_consumed += 1;
            // Counted but not capped within the window; see DESIGN.md
            info!(
                phone_number = %phone,
                attempts = session.attempts_consumed,
                "Verification code mismatch"
            );
            return Err(AuthError::Mismatched);
        }

        sessions.remove(&key);
        drop(sessions);

        let principal = Principal {
            phone_number: phone,
            role,
        };

        if let Err(e) = self
            .registry
            .append_login_row(&principal.phone_number, principal.role)
            .await
        {
            warn!(error = %e, "Failed to append login row");
        }

        info!(phone_number = %principal.phone_number, role = %principal.role, "OTP verified");
        Ok(principal)
    }

    /// Abandon the in-progress attempt. Safe in every state; a no-op when
    /// nothing is in progress.
    pub async fn cancel(&self, phone_number: &str, role: AccessRole) {
        let key = SessionKey {
            phone_number: format_phone_number(phone_number),
            role,
        };
        self.sessions.write().await.remove(&key);
    }

    /// Generate, dispatch and store a fresh code. The session map is only
    /// touched after the gateway accepted the message: a delivery failure
    /// leaves the previous state untouched.
    async fn dispatch_code(&self, phone: &str, role: AccessRole) -> Result<(), AuthError> {
        let code = generate_verification_code();
        let body = format!(
            "[BASECAMP Agent] 인증번호 [{}]를 입력해주세요. (유효시간 {}초)",
            code, OTP_VALIDITY_SECONDS
        );

        if let Err(e) = self.sms.send(phone, SMS_LABEL_VERIFICATION, &body).await {
            warn!(phone_number = %phone, error = %e, "Verification SMS delivery failed");
            return Err(AuthError::DeliveryFailed);
        }

        if let Err(e) = self.registry.append_sms_log(phone, SMS_LABEL_VERIFICATION).await {
            warn!(error = %e, "Failed to append SMS log row");
        }

        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, s| {
            now.signed_duration_since(s.issued_at) <= Duration::seconds(SESSION_ABANDON_SECONDS)
        });
        sessions.insert(
            SessionKey {
                phone_number: phone.to_string(),
                role,
            },
            OtpSession {
                code,
                issued_at: now,
                attempts_consumed: 0,
            },
        );

        info!(phone_number = %phone, role = %role, "Verification code sent");
        Ok(())
    }

    #[cfg(test)]
    async fn backdate_session(&self, phone: &str, role: AccessRole, seconds: i64) {
        let key = SessionKey {
            phone_number: phone.to_string(),
            role,
        };
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&key) {
            session.issued_at = session.issued_at - Duration::seconds(seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registry::tables::{TBL_LOGINS, TBL_SMS_LOG};
    use crate::kernel::test_dependencies::{MockSmsService, MockTabularStore};

    const PHONE: &str = "01011112222";

    struct Fixture {
        manager: OtpSessionManager,
        sms: Arc<MockSmsService>,
        store: Arc<MockTabularStore>,
    }

    fn fixture(status: &str) -> Fixture {
        let store = Arc::new(
            MockTabularStore::new().with_request("1", "김학생", PHONE, "일반(학생)", status),
        );
        let sms = Arc::new(MockSmsService::new());
        let manager = OtpSessionManager::new(
            Arc::new(RegistryClient::new(store.clone())),
            sms.clone(),
        );
        Fixture { manager, sms, store }
    }

    /// Pull the issued code out of the SMS body: "... [123456] ..."
    fn sent_code(sms: &MockSmsService) -> String {
        let body = sms.last_body().expect("an SMS should have been sent");
        let start = body.find('[').unwrap() + 1;
        // Skip the "[BASECAMP Agent]" prefix bracket
        let rest = &body[start..];
        let start = rest.find('[').unwrap() + 1;
        let end = rest[start..].find(']').unwrap() + start;
        rest[start..end].to_string()
    }

    #[tokio::test]
    async fn unknown_phone_gets_no_code_and_no_session() {
        let f = fixture("활성");

        let err = f
            .manager
            .issue_code("01099998888", AccessRole::Regular)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::NotAuthorized(DenialReason::NotFound)
        ));
        assert!(f.sms.sent().is_empty(), "No SMS for unauthorized numbers");

        // And no session was left behind for a later verify
        let err = f
            .manager
            .verify_code("01099998888", AccessRole::Regular, "000000")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoSession));
    }

    #[tokio::test]
    async fn waiting_and_inactive_are_refused_without_sms() {
        let f = fixture("대기");
        let err = f
            .manager
            .issue_code(PHONE, AccessRole::Regular)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::NotAuthorized(DenialReason::Waiting)
        ));

        let f = fixture("비활성");
        let err = f
            .manager
            .issue_code(PHONE, AccessRole::Regular)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::NotAuthorized(DenialReason::Inactive)
        ));
        assert!(f.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn verify_succeeds_exactly_once() {
        let f = fixture("활성");
        f.manager.issue_code(PHONE, AccessRole::Regular).await.unwrap();
        let code = sent_code(&f.sms);

        let principal = f
            .manager
            .verify_code(PHONE, AccessRole::Regular, &code)
            .await
            .unwrap();
        assert_eq!(principal.phone_number, PHONE);
        assert_eq!(principal.role, AccessRole::Regular);

        // Session is gone; the same code must not verify again
        let err = f
            .manager
            .verify_code(PHONE, AccessRole::Regular, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoSession));
    }

    #[tokio::test]
    async fn correct_code_after_window_is_expired() {
        let f = fixture("활성");
        f.manager.issue_code(PHONE, AccessRole::Regular).await.unwrap();
        let code = sent_code(&f.sms);

        f.manager
            .backdate_session(PHONE, AccessRole::Regular, 31)
            .await;

        let err = f
            .manager
            .verify_code(PHONE, AccessRole::Regular, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[tokio::test]
    async fn mismatch_keeps_the_code_valid() {
        let f = fixture("활성");
        f.manager.issue_code(PHONE, AccessRole::Regular).await.unwrap();
        let code = sent_code(&f.sms);

        let err = f
            .manager
            .verify_code(PHONE, AccessRole::Regular, "999999")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Mismatched));

        // Retrying with the real code still works
        f.manager
            .verify_code(PHONE, AccessRole::Regular, &code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resend_invalidates_previous_code() {
        let f = fixture("활성");
        f.manager.issue_code(PHONE, AccessRole::Regular).await.unwrap();
        let first = sent_code(&f.sms);

        f.manager.resend_code(PHONE, AccessRole::Regular).await.unwrap();
        let second = sent_code(&f.sms);
        assert_ne!(first, second, "6 uniform digits collide with probability 1e-6");

        let err = f
            .manager
            .verify_code(PHONE, AccessRole::Regular, &first)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Mismatched));

        f.manager
            .verify_code(PHONE, AccessRole::Regular, &second)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resend_works_after_the_window_expires() {
        let f = fixture("활성");
        f.manager.issue_code(PHONE, AccessRole::Regular).await.unwrap();
        let first = sent_code(&f.sms);

        f.manager
            .backdate_session(PHONE, AccessRole::Regular, 31)
            .await;
        let err = f
            .manager
            .verify_code(PHONE, AccessRole::Regular, &first)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));

        // The expired session is retained, so a resend starts a fresh window
        f.manager.resend_code(PHONE, AccessRole::Regular).await.unwrap();
        let second = sent_code(&f.sms);
        f.manager
            .verify_code(PHONE, AccessRole::Regular, &second)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn abandoned_sessions_are_reaped_on_the_next_dispatch() {
        let store = Arc::new(
            MockTabularStore::new()
                .with_request("1", "가", "01011110001", "일반(학생)", "활성")
                .with_request("2", "나", "01011110002", "일반(학생)", "활성"),
        );
        let sms = Arc::new(MockSmsService::new());
        let manager = OtpSessionManager::new(
            Arc::new(RegistryClient::new(store)),
            sms.clone(),
        );

        manager.issue_code("01011110001", AccessRole::Regular).await.unwrap();
        manager
            .backdate_session("01011110001", AccessRole::Regular, 601)
            .await;

        // Another user's issuance sweeps the abandoned attempt out
        manager.issue_code("01011110002", AccessRole::Regular).await.unwrap();

        let err = manager
            .resend_code("01011110001", AccessRole::Regular)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoSession));

        // The fresh session is untouched by the sweep
        let code = sent_code(&sms);
        manager
            .verify_code("01011110002", AccessRole::Regular, &code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resend_without_session_is_refused() {
        let f = fixture("활성");
        let err = f
            .manager
            .resend_code(PHONE, AccessRole::Regular)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoSession));
    }

    #[tokio::test]
    async fn delivery_failure_leaves_state_untouched() {
        let f = fixture("활성");
        f.sms.set_fail(true);

        let err = f
            .manager
            .issue_code(PHONE, AccessRole::Regular)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DeliveryFailed));

        // No half-issued session
        let err = f
            .manager
            .verify_code(PHONE, AccessRole::Regular, "000000")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoSession));
    }

    #[tokio::test]
    async fn failed_resend_keeps_old_code_valid() {
        let f = fixture("활성");
        f.manager.issue_code(PHONE, AccessRole::Regular).await.unwrap();
        let code = sent_code(&f.sms);

        f.sms.set_fail(true);
        let err = f
            .manager
            .resend_code(PHONE, AccessRole::Regular)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DeliveryFailed));
        f.sms.set_fail(false);

        f.manager
            .verify_code(PHONE, AccessRole::Regular, &code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancel_is_safe_in_any_state() {
        let f = fixture("활성");

        // No-op while idle
        f.manager.cancel(PHONE, AccessRole::Regular).await;

        f.manager.issue_code(PHONE, AccessRole::Regular).await.unwrap();
        let code = sent_code(&f.sms);
        f.manager.cancel(PHONE, AccessRole::Regular).await;

        let err = f
            .manager
            .verify_code(PHONE, AccessRole::Regular, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoSession));
    }

    #[tokio::test]
    async fn concurrent_users_do_not_share_a_slot() {
        let store = Arc::new(
            MockTabularStore::new()
                .with_request("1", "가", "01011110001", "일반(학생)", "활성")
                .with_request("2", "나", "01011110002", "일반(학생)", "활성"),
        );
        let sms = Arc::new(MockSmsService::new());
        let manager = OtpSessionManager::new(
            Arc::new(RegistryClient::new(store)),
            sms.clone(),
        );

        manager.issue_code("01011110001", AccessRole::Regular).await.unwrap();
        let code_a = sent_code(&sms);
        manager.issue_code("01011110002", AccessRole::Regular).await.unwrap();
        let code_b = sent_code(&sms);

        // Second user's issuance must not clobber the first user's code
        manager
            .verify_code("01011110001", AccessRole::Regular, &code_a)
            .await
            .unwrap();
        manager
            .verify_code("01011110002", AccessRole::Regular, &code_b)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn successful_flows_append_sms_and_login_rows() {
        let f = fixture("활성");
        f.manager.issue_code(PHONE, AccessRole::Regular).await.unwrap();
        let code = sent_code(&f.sms);
        f.manager
            .verify_code(PHONE, AccessRole::Regular, &code)
            .await
            .unwrap();

        assert_eq!(f.store.appended_rows(TBL_SMS_LOG).len(), 1);
        let logins = f.store.appended_rows(TBL_LOGINS);
        assert_eq!(logins.len(), 1);
        assert_eq!(logins[0][2], PHONE);
    }
}
