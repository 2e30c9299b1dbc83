// Mock implementations of the collaborator traits for testing.
//
// Mocks record every call so tests can assert on exactly what was sent
// or written, and can be flipped into a failing mode to exercise the
// degraded paths.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{BaseAnalyzer, BaseSmsService, BaseTabularStore, QuizAnalysis, TableRow};
use crate::domains::registry::tables::TBL_MEMBER_REQUESTS;

// =============================================================================
// Mock Tabular Store
// =============================================================================

/// One recorded update_cell call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub table: String,
    pub key_column: String,
    pub key: String,
    pub column: String,
    pub value: String,
}

pub struct MockTabularStore {
    rows: Arc<Mutex<HashMap<String, Vec<TableRow>>>>,
    appended: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    updates: Arc<Mutex<Vec<CellUpdate>>>,
    fail: AtomicBool,
}

impl MockTabularStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(HashMap::new())),
            appended: Arc::new(Mutex::new(Vec::new())),
            updates: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
        }
    }

    /// Seed one raw row into a table served by `read_all`
    pub fn with_row(self, table: &str, row: TableRow) -> Self {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
        self
    }

    /// Seed one access-request row with the standard columns
    pub fn with_request(
        self,
        req_id: &str,
        name: &str,
        phone: &str,
        access_type: &str,
        status: &str,
    ) -> Self {
        let row: TableRow = [
            ("req_id", req_id),
            ("date_partition", "20250101"),
            ("create_dt", "2025-01-01 09:00:00"),
            ("name", name),
            ("phn_no", phone),
            ("access_type", access_type),
            ("agr_svc_terms", "Y"),
            ("agr_psnl_info", "Y"),
            ("status", status),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        self.with_row(TBL_MEMBER_REQUESTS, row)
    }

    /// Make every store call fail (registry unavailable)
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All rows appended to `table`, in order
    pub fn appended_rows(&self, table: &str) -> Vec<Vec<String>> {
        self.appended
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// All update_cell calls, in order
    pub fn updates(&self) -> Vec<CellUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl Default for MockTabularStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseTabularStore for MockTabularStore {
    async fn read_all(&self, table: &str) -> Result<Vec<TableRow>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("mock store unavailable"));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_row(&self, table: &str, row: &[String]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("mock store unavailable"));
        }
        self.appended
            .lock()
            .unwrap()
            .push((table.to_string(), row.to_vec()));
        Ok(())
    }

    async fn update_cell(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        column: &str,
        value: &str,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("mock store unavailable"));
        }
        self.updates.lock().unwrap().push(CellUpdate {
            table: table.to_string(),
            key_column: key_column.to_string(),
            key: key.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Mock SMS Service
// =============================================================================

/// One recorded send call
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub label: String,
    pub body: String,
}

pub struct MockSmsService {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    fail: AtomicBool,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every send fail (gateway down)
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All messages sent, in order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Body of the most recent message, if any
    pub fn last_body(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|m| m.body.clone())
    }
}

impl Default for MockSmsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSmsService for MockSmsService {
    async fn send(&self, phone_number: &str, label: &str, body: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("mock gateway down"));
        }
        self.sent.lock().unwrap().push(SentMessage {
            to: phone_number.to_string(),
            label: label.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Mock Analyzer
// =============================================================================

pub struct MockAnalyzer {
    result: QuizAnalysis,
    calls: Arc<Mutex<Vec<usize>>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            result: QuizAnalysis {
                answer: "3".to_string(),
                description: "가속도는 힘을 질량으로 나눈 값입니다.".to_string(),
                keywords: "뉴턴의 운동 법칙".to_string(),
                usage_tokens: 1234,
            },
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_result(mut self, result: QuizAnalysis) -> Self {
        self.result = result;
        self
    }

    /// Byte lengths of the images passed to analyze, in order
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAnalyzer for MockAnalyzer {
    async fn analyze(&self, image: &[u8]) -> Result<QuizAnalysis> {
        self.calls.lock().unwrap().push(image.len());
        Ok(self.result.clone())
    }
}
