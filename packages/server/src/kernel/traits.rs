// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "issue an OTP code") lives in domain services that
// use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseSmsService)

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of a backing table, keyed by column name. Cell values are
/// strings; numeric coercion done by the store is undone at the domain
/// boundary (see `domains::registry::models::format_phone_number`).
pub type TableRow = HashMap<String, String>;

// =============================================================================
// Tabular Store Trait (Infrastructure - registry backend)
// =============================================================================

#[async_trait]
pub trait BaseTabularStore: Send + Sync {
    /// Read every row of a named table
    async fn read_all(&self, table: &str) -> Result<Vec<TableRow>>;

    /// Append one row (positional cells, in header order) to a named table
    async fn append_row(&self, table: &str, row: &[String]) -> Result<()>;

    /// Update a single cell in the row whose `key_column` equals `key`
    async fn update_cell(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        column: &str,
        value: &str,
    ) -> Result<()>;
}

// =============================================================================
// SMS Service Trait (Infrastructure - notification gateway)
// =============================================================================

#[async_trait]
pub trait BaseSmsService: Send + Sync {
    /// Send a text message to a phone number.
    ///
    /// `label` is the short message category recorded in gateway and SMS
    /// logs (e.g. "인증번호"); `body` is the text delivered to the phone.
    async fn send(&self, phone_number: &str, label: &str, body: &str) -> Result<()>;
}

// =============================================================================
// Analyzer Trait (Infrastructure - opaque quiz analysis capability)
// =============================================================================

/// Result of analyzing one problem image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnalysis {
    pub answer: String,
    pub description: String,
    pub keywords: String,
    pub usage_tokens: u32,
}

#[async_trait]
pub trait BaseAnalyzer: Send + Sync {
    /// Analyze a problem image and return answer, explanation, keywords
    /// and the token cost of the call
    async fn analyze(&self, image: &[u8]) -> Result<QuizAnalysis>;
}
