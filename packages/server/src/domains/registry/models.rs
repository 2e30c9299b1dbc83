//! Registry data types and phone-number normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kernel::TableRow;

/// Authorization state of one access request.
///
/// Wire labels are the Korean values stored in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryStatus {
    Active,
    Waiting,
    Inactive,
}

impl RegistryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryStatus::Active => "활성",
            RegistryStatus::Waiting => "대기",
            RegistryStatus::Inactive => "비활성",
        }
    }

    /// Parse a wire label; anything outside the three known values is None
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "활성" => Some(RegistryStatus::Active),
            "대기" => Some(RegistryStatus::Waiting),
            "비활성" => Some(RegistryStatus::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for RegistryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested access tier. Chosen by the caller at login (admin toggle) and
/// confirmed against the registry for that (phone, role) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessRole {
    Regular,
    Administrator,
}

impl AccessRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessRole::Regular => "일반(학생)",
            AccessRole::Administrator => "관리자",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "일반(학생)" => Some(AccessRole::Regular),
            "관리자" => Some(AccessRole::Administrator),
            _ => None,
        }
    }

    pub fn from_admin_flag(admin: bool) -> Self {
        if admin {
            AccessRole::Administrator
        } else {
            AccessRole::Regular
        }
    }
}

impl std::fmt::Display for AccessRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the access-request table.
///
/// Everything except `status` is immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub req_id: String,
    pub date_partition: String,
    pub create_dt: String,
    pub name: String,
    pub phone_number: String,
    pub role: AccessRole,
    pub terms_accepted: String,
    pub privacy_accepted: String,
    pub status: RegistryStatus,
}

impl RegistryEntry {
    /// Build an entry from a raw backend row. Returns None for rows whose
    /// status or role label is unknown; such rows never grant access and
    /// are skipped (with a warning) by the client.
    pub fn from_row(row: &TableRow) -> Option<Self> {
        let cell = |name: &str| row.get(name).cloned().unwrap_or_default();

        let status = RegistryStatus::parse(&cell("status"))?;
        let role = AccessRole::parse(&cell("access_type"))?;

        Some(Self {
            req_id: cell("req_id"),
            date_partition: cell("date_partition"),
            create_dt: cell("create_dt"),
            name: cell("name"),
            phone_number: format_phone_number(&cell("phn_no")),
            role,
            terms_accepted: cell("agr_svc_terms"),
            privacy_accepted: cell("agr_psnl_info"),
            status,
        })
    }
}

/// Normalize a phone number as stored by the backend.
///
/// The sheet coerces phone numbers to numbers, which drops the leading
/// zero and can leave a float-style ".0" suffix. Separators entered by
/// users are stripped as well.
pub fn format_phone_number(raw: &str) -> String {
    let mut phone: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();

    if let Some(stripped) = phone.strip_suffix(".0") {
        phone = stripped.to_string();
    }

    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        format!("0{}", phone)
    } else {
        phone
    }
}

/// Date partition for log rows, e.g. "20250830"
pub fn date_partition(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// Timestamp for log rows, e.g. "2025-08-30 12:34:56"
pub fn datetime_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}
