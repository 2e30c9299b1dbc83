//! Registry client - sole reader/writer of the registry backend.
//!
//! Transport errors from the store never escape raw: every failure is
//! converted to `RegistryError::Unavailable`, and callers treat that as
//! "do not grant access", never as permission.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use super::models::{
    date_partition, datetime_stamp, format_phone_number, AccessRole, RegistryEntry, RegistryStatus,
};
use super::tables::{TBL_LOGINS, TBL_MEMBER_REQUESTS, TBL_SMS_LOG};
use crate::kernel::BaseTabularStore;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry backend unavailable: {0}")]
    Unavailable(String),
}

pub struct RegistryClient {
    store: Arc<dyn BaseTabularStore>,
}

impl RegistryClient {
    pub fn new(store: Arc<dyn BaseTabularStore>) -> Self {
        Self { store }
    }

    /// Current status of the request for `(phone, role)`, or None when no
    /// such request exists. Both sides are compared after normalization.
    pub async fn lookup_status(
        &self,
        phone_number: &str,
        role: AccessRole,
    ) -> Result<Option<RegistryStatus>, RegistryError> {
        let phone = format_phone_number(phone_number);
        let entries = self.load_entries().await?;

        Ok(entries
            .into_iter()
            .find(|entry| entry.role == role && entry.phone_number == phone)
            .map(|entry| entry.status))
    }

    /// Full snapshot of the access-request table. Rows with unknown status
    /// or role labels are skipped; they can never grant access.
    pub async fn load_entries(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        let rows = self
            .store
            .read_all(TBL_MEMBER_REQUESTS)
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            match RegistryEntry::from_row(row) {
                Some(entry) => entries.push(entry),
                None => {
                    warn!(?row, "Skipping registry row with unknown status or role label");
                }
            }
        }
        Ok(entries)
    }

    /// Append one row to a named table. Used for audit, usage, SMS and
    /// login logs; all of them are append-only.
    pub async fn append_row(&self, table: &str, row: &[String]) -> Result<(), RegistryError> {
        self.store
            .append_row(table, row)
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))
    }

    /// Log one outbound SMS (best-effort at call sites)
    pub async fn append_sms_log(&self, phone_number: &str, label: &str) -> Result<(), RegistryError> {
        let now = Utc::now();
        self.append_row(
            TBL_SMS_LOG,
            &[
                date_partition(now),
                datetime_stamp(now),
                format_phone_number(phone_number),
                label.to_string(),
            ],
        )
        .await
    }

    /// Log one successful login (best-effort at call sites)
    pub async fn append_login_row(
        &self,
        phone_number: &str,
        role: AccessRole,
    ) -> Result<(), RegistryError> {
        let now = Utc::now();
        self.append_row(
            TBL_LOGINS,
            &[
                date_partition(now),
                datetime_stamp(now),
                format_phone_number(phone_number),
                role.as_str().to_string(),
            ],
        )
        .await
    }

    /// Write back only the rows whose status differs between the two
    /// snapshots, one cell update per changed row. Unrelated rows are
    /// untouched so concurrent edits elsewhere are not clobbered.
    ///
    /// Returns the number of rows written.
    pub async fn apply_status_changes(
        &self,
        original: &[RegistryEntry],
        edited: &[RegistryEntry],
    ) -> Result<usize, RegistryError> {
        let mut changed = 0;

        for entry in edited {
            let Some(before) = original.iter().find(|o| o.req_id == entry.req_id) else {
                warn!(req_id = %entry.req_id, "Edited row missing from original snapshot; skipping");
                continue;
            };
            if before.status == entry.status {
                continue;
            }

            self.store
                .update_cell(
                    TBL_MEMBER_REQUESTS,
                    "req_id",
                    &entry.req_id,
                    "status",
                    entry.status.as_str(),
                )
                .await
                .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
            changed += 1;
        }

        Ok(changed)
    }
}
