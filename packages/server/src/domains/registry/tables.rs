//! Named tables of the registry backend.

/// Access requests: one row per (phone, role) request; only `status` is
/// mutable after creation.
pub const TBL_MEMBER_REQUESTS: &str = "tbl_mbr_req_incr";

/// Audit trail of admin status changes (append-only).
pub const TBL_ACCESS_CHANGES: &str = "tbl_mbr_access_chg_incr";

/// Analyzer usage log (append-only).
pub const TBL_AGENT_USAGE: &str = "tbl_agent_usg_incr";

/// Outbound SMS log (append-only).
pub const TBL_SMS_LOG: &str = "tbl_sms_log_incr";

/// Successful login log (append-only).
pub const TBL_LOGINS: &str = "tbl_mbr_login_incr";
