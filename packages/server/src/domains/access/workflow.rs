//! Access-control workflow (administrator only).
//!
//! Commit order is deliberate: per changed row, notification first, then
//! the audit row; the registry write-back happens after all rows so the
//! audit trail stays ahead of the authoritative state. Notification and
//! audit writes are best-effort; the guarantee on audit rows is
//! at-least-once relative to the persisted status, not exactly-once.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::models::{AccessChangeRecord, CommitOutcome, StatusEdit};
use crate::domains::auth::Principal;
use crate::domains::registry::tables::TBL_ACCESS_CHANGES;
use crate::domains::registry::{
    AccessRole, RegistryClient, RegistryEntry, RegistryError, RegistryStatus,
};
use crate::kernel::BaseSmsService;

const SMS_LABEL_APPROVED: &str = "권한 승인";
const SMS_LABEL_REJECTED: &str = "권한 회수";

const MSG_APPROVED: &str =
    "[BASECAMP Agent] 권한 요청이 승인되었습니다. 지금부터 서비스를 이용하실 수 있습니다.";
const MSG_REJECTED: &str = "[BASECAMP Agent] 권한이 회수되었습니다. 관리자에게 문의하세요.";

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Invalid status value: {0}")]
    InvalidStatusValue(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

struct StatusChange {
    req_id: String,
    phone_number: String,
    role: AccessRole,
    from: RegistryStatus,
    to: RegistryStatus,
}

/// Which notification, if any, a transition triggers. Only transitions
/// touching Active notify; Waiting <-> Inactive is silent.
fn notification_for(from: RegistryStatus, to: RegistryStatus) -> Option<(&'static str, &'static str)> {
    match (from, to) {
        (RegistryStatus::Waiting | RegistryStatus::Inactive, RegistryStatus::Active) => {
            Some((SMS_LABEL_APPROVED, MSG_APPROVED))
        }
        (RegistryStatus::Active, RegistryStatus::Waiting | RegistryStatus::Inactive) => {
            Some((SMS_LABEL_REJECTED, MSG_REJECTED))
        }
        _ => None,
    }
}

pub struct AccessControlWorkflow {
    registry: Arc<RegistryClient>,
    sms: Arc<dyn BaseSmsService>,
}

impl AccessControlWorkflow {
    pub fn new(registry: Arc<RegistryClient>, sms: Arc<dyn BaseSmsService>) -> Self {
        Self { registry, sms }
    }

    /// Admin view of the registry, optionally filtered by status
    pub async fn list_entries(
        &self,
        filter: Option<RegistryStatus>,
    ) -> Result<Vec<RegistryEntry>, AccessError> {
        let mut entries = self.registry.load_entries().await?;
        if let Some(status) = filter {
            entries.retain(|e| e.status == status);
        }
        Ok(entries)
    }

    /// Apply an edit set against the original snapshot.
    ///
    /// Any invalid status value rejects the whole batch before a single
    /// write or notification. Edits for unknown req_ids are skipped with
    /// a warning (the row vanished between load and commit).
    pub async fn commit(
        &self,
        admin: &Principal,
        original: &[RegistryEntry],
        edits: &[StatusEdit],
    ) -> Result<CommitOutcome, AccessError> {
        // 1. Validate everything up front
        let mut parsed = Vec::with_capacity(edits.len());
        for edit in edits {
            let status = RegistryStatus::parse(&edit.status)
                .ok_or_else(|| AccessError::InvalidStatusValue(edit.status.clone()))?;
            parsed.push((edit.req_id.as_str(), status));
        }

        // 2. Build the edited snapshot and collect the actual flips
        let mut edited: Vec<RegistryEntry> = original.to_vec();
        let mut changes: Vec<StatusChange> = Vec::new();
        for (req_id, new_status) in parsed {
            let Some(entry) = edited.iter_mut().find(|e| e.req_id == req_id) else {
                warn!(req_id, "Edit for unknown request id; skipping");
                continue;
            };
            if entry.status == new_status {
                continue;
            }
            changes.push(StatusChange {
                req_id: entry.req_id.clone(),
                phone_number: entry.phone_number.clone(),
                role: entry.role,
                from: entry.status,
                to: new_status,
            });
            entry.status = new_status;
        }

        if changes.is_empty() {
            return Ok(CommitOutcome::NoChanges);
        }

        // 3. Per flip: notify (best-effort), then audit (best-effort)
        let mut notified = 0;
        for change in &changes {
            if let Some((label, body)) = notification_for(change.from, change.to) {
                match self.sms.send(&change.phone_number, label, body).await {
                    Ok(()) => {
                        notified += 1;
                        if let Err(e) = self.registry.append_sms_log(&change.phone_number, label).await
                        {
                            warn!(error = %e, "Failed to append SMS log row");
                        }
                    }
                    Err(e) => {
                        warn!(
                            phone_number = %change.phone_number,
                            error = %e,
                            "Status notification failed; audit row still written"
                        );
                    }
                }
            }

            let record = AccessChangeRecord::new(
                &change.req_id,
                &change.phone_number,
                change.role,
                admin,
                change.from,
                change.to,
            );
            if let Err(e) = self.registry.append_row(TBL_ACCESS_CHANGES, &record.to_row()).await {
                warn!(req_id = %change.req_id, error = %e, "Failed to append audit row");
            }
        }

        // 4. Persist last, keeping the audit trail ahead of the registry
        let updated = self.registry.apply_status_changes(original, &edited).await?;

        info!(
            changed_by = %admin.phone_number,
            updated,
            notified,
            "Access-control edits committed"
        );
        Ok(CommitOutcome::Applied { updated, notified })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registry::tables::TBL_MEMBER_REQUESTS;
    use crate::domains::registry::AccessRole;
    use crate::kernel::test_dependencies::{MockSmsService, MockTabularStore};

    fn admin() -> Principal {
        Principal {
            phone_number: "01099990000".to_string(),
            role: AccessRole::Administrator,
        }
    }

    struct Fixture {
        workflow: AccessControlWorkflow,
        registry: Arc<RegistryClient>,
        sms: Arc<MockSmsService>,
        store: Arc<MockTabularStore>,
    }

    fn fixture(store: MockTabularStore) -> Fixture {
        let store = Arc::new(store);
        let registry = Arc::new(RegistryClient::new(store.clone()));
        let sms = Arc::new(MockSmsService::new());
        Fixture {
            workflow: AccessControlWorkflow::new(registry.clone(), sms.clone()),
            registry,
            sms,
            store,
        }
    }

    fn edit(req_id: &str, status: &str) -> StatusEdit {
        StatusEdit {
            req_id: req_id.to_string(),
            status: status.to_string(),
        }
    }

    #[tokio::test]
    async fn invalid_status_value_rejects_the_whole_batch() {
        let f = fixture(
            MockTabularStore::new()
                .with_request("1", "가", "01011110001", "일반(학생)", "대기")
                .with_request("2", "나", "01011110002", "일반(학생)", "대기"),
        );
        let original = f.registry.load_entries().await.unwrap();

        let err = f
            .workflow
            .commit(
                &admin(),
                &original,
                &[edit("1", "활성"), edit("2", "approved")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidStatusValue(v) if v == "approved"));

        // Zero writes, zero notifications, zero audit rows
        assert!(f.store.updates().is_empty());
        assert!(f.sms.sent().is_empty());
        assert!(f.store.appended_rows(TBL_ACCESS_CHANGES).is_empty());
    }

    #[tokio::test]
    async fn approving_a_waiting_request_notifies_audits_and_persists() {
        let f = fixture(
            MockTabularStore::new().with_request("1", "김학생", "01011112222", "일반(학생)", "대기"),
        );
        let original = f.registry.load_entries().await.unwrap();

        let outcome = f
            .workflow
            .commit(&admin(), &original, &[edit("1", "활성")])
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                updated: 1,
                notified: 1
            }
        );

        // Exactly one notification, to the affected phone
        let sent = f.sms.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "01011112222");

        // Exactly one audit row with from/to and the acting admin
        let audits = f.store.appended_rows(TBL_ACCESS_CHANGES);
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0][0], "1");
        assert_eq!(audits[0][3], "01011112222");
        assert_eq!(audits[0][5], "01099990000");
        assert_eq!(audits[0][6], "대기");
        assert_eq!(audits[0][7], "활성");

        // Registry row updated to Active
        let updates = f.store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].table, TBL_MEMBER_REQUESTS);
        assert_eq!(updates[0].key, "1");
        assert_eq!(updates[0].value, "활성");
    }

    #[tokio::test]
    async fn revoking_active_access_sends_the_rejected_notice() {
        let f = fixture(
            MockTabularStore::new().with_request("1", "김학생", "01011112222", "일반(학생)", "활성"),
        );
        let original = f.registry.load_entries().await.unwrap();

        f.workflow
            .commit(&admin(), &original, &[edit("1", "비활성")])
            .await
            .unwrap();

        let sent = f.sms.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].label, "권한 회수");
    }

    #[tokio::test]
    async fn waiting_to_inactive_audits_without_notifying() {
        let f = fixture(
            MockTabularStore::new().with_request("1", "김학생", "01011112222", "일반(학생)", "대기"),
        );
        let original = f.registry.load_entries().await.unwrap();

        let outcome = f
            .workflow
            .commit(&admin(), &original, &[edit("1", "비활성")])
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                updated: 1,
                notified: 0
            }
        );
        assert!(f.sms.sent().is_empty());
        assert_eq!(f.store.appended_rows(TBL_ACCESS_CHANGES).len(), 1);
    }

    #[tokio::test]
    async fn unchanged_edit_set_reports_no_changes() {
        let f = fixture(
            MockTabularStore::new().with_request("1", "김학생", "01011112222", "일반(학생)", "대기"),
        );
        let original = f.registry.load_entries().await.unwrap();

        let outcome = f
            .workflow
            .commit(&admin(), &original, &[edit("1", "대기")])
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::NoChanges);
        assert!(f.sms.sent().is_empty());
        assert!(f.store.updates().is_empty());
        assert!(f.store.appended_rows(TBL_ACCESS_CHANGES).is_empty());
    }

    #[tokio::test]
    async fn failed_notification_still_audits_and_persists() {
        let f = fixture(
            MockTabularStore::new().with_request("1", "김학생", "01011112222", "일반(학생)", "대기"),
        );
        let original = f.registry.load_entries().await.unwrap();
        f.sms.set_fail(true);

        let outcome = f
            .workflow
            .commit(&admin(), &original, &[edit("1", "활성")])
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                updated: 1,
                notified: 0
            }
        );
        assert_eq!(f.store.appended_rows(TBL_ACCESS_CHANGES).len(), 1);
        assert_eq!(f.store.updates().len(), 1);
    }

    #[tokio::test]
    async fn list_entries_filters_by_status() {
        let f = fixture(
            MockTabularStore::new()
                .with_request("1", "가", "01011110001", "일반(학생)", "대기")
                .with_request("2", "나", "01011110002", "일반(학생)", "활성"),
        );

        let all = f.workflow.list_entries(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let waiting = f
            .workflow
            .list_entries(Some(RegistryStatus::Waiting))
            .await
            .unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].req_id, "1");
    }
}
