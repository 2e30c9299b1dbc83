//! Access-control data types.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domains::auth::Principal;
use crate::domains::registry::models::{date_partition, datetime_stamp};
use crate::domains::registry::{AccessRole, RegistryStatus};

/// One submitted edit: the status value arrives as the raw string typed
/// by the admin and is validated before anything is applied. Only the
/// status is editable; other columns are not representable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEdit {
    pub req_id: String,
    pub status: String,
}

/// Audit row written for every status flip (append-only)
#[derive(Debug, Clone)]
pub struct AccessChangeRecord {
    pub req_id: String,
    pub date_partition: String,
    pub create_dt: String,
    pub phone_number: String,
    pub role: AccessRole,
    pub changed_by: String,
    pub from_status: RegistryStatus,
    pub to_status: RegistryStatus,
}

impl AccessChangeRecord {
    pub fn new(
        req_id: &str,
        phone_number: &str,
        role: AccessRole,
        changed_by: &Principal,
        from_status: RegistryStatus,
        to_status: RegistryStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            req_id: req_id.to_string(),
            date_partition: date_partition(now),
            create_dt: datetime_stamp(now),
            phone_number: phone_number.to_string(),
            role,
            changed_by: changed_by.phone_number.clone(),
            from_status,
            to_status,
        }
    }

    /// Positional cells in audit-table header order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.req_id.clone(),
            self.date_partition.clone(),
            self.create_dt.clone(),
            self.phone_number.clone(),
            self.role.as_str().to_string(),
            self.changed_by.clone(),
            self.from_status.as_str().to_string(),
            self.to_status.as_str().to_string(),
        ]
    }
}

/// Result of committing an edit set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Statuses changed: rows written back and notifications attempted
    Applied { updated: usize, notified: usize },
    /// Edited snapshot equals the original; nothing was written or sent
    NoChanges,
}
