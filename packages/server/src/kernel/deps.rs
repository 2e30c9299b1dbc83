//! Server dependencies for domain services (using traits for testability)
//!
//! This module provides the central dependency container handed to the
//! domain services. All external collaborators sit behind trait
//! abstractions to enable testing.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sens::models::SmsResponse;
use sens::SensService;
use std::future::Future;
use std::sync::Arc;

use crate::kernel::{BaseAnalyzer, BaseSmsService, BaseTabularStore};

// =============================================================================
// SensService Adapter (implements BaseSmsService trait)
// =============================================================================

/// Wrapper around SensService that implements the BaseSmsService trait.
///
/// Retries once on gateway failure; never more (a second failure is
/// surfaced to the caller as a delivery error).
pub struct SensAdapter(pub Arc<SensService>);

impl SensAdapter {
    pub fn new(service: Arc<SensService>) -> Self {
        Self(service)
    }
}

const SEND_ATTEMPTS: u32 = 2;

/// Drive `send` until the gateway accepts, up to SEND_ATTEMPTS calls.
/// A non-"202" status counts as a failure like a transport error does;
/// the last error is what the caller sees.
async fn deliver<F, Fut>(phone_number: &str, mut send: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<SmsResponse, &'static str>>,
{
    let mut last_error = anyhow!("SMS send not attempted");

    for attempt in 1..=SEND_ATTEMPTS {
        match send().await {
            Ok(response) if response.accepted() => return Ok(()),
            Ok(response) => {
                last_error = anyhow!(
                    "SENS rejected message ({} {})",
                    response.status_code,
                    response.status_name
                );
            }
            Err(e) => {
                last_error = anyhow!("{}", e);
            }
        }
        tracing::warn!(attempt, phone_number, "SMS send attempt failed");
    }

    Err(last_error)
}

#[async_trait]
impl BaseSmsService for SensAdapter {
    async fn send(&self, phone_number: &str, label: &str, body: &str) -> Result<()> {
        deliver(phone_number, || self.0.send_sms(phone_number, label, body)).await
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to domain services
#[derive(Clone)]
pub struct ServerDeps {
    /// Registry backend (tabular store addressed by named tables)
    pub store: Arc<dyn BaseTabularStore>,
    /// Notification gateway
    pub sms: Arc<dyn BaseSmsService>,
    /// Opaque quiz analyzer (image in, answer/explanation/keywords out)
    pub analyzer: Arc<dyn BaseAnalyzer>,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseTabularStore>,
        sms: Arc<dyn BaseSmsService>,
        analyzer: Arc<dyn BaseAnalyzer>,
    ) -> Self {
        Self {
            store,
            sms,
            analyzer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn response(status_code: &str) -> SmsResponse {
        SmsResponse {
            request_id: "req-1".to_string(),
            request_time: "2025-08-30 12:00:00".to_string(),
            status_code: status_code.to_string(),
            status_name: if status_code == "202" { "success" } else { "fail" }.to_string(),
        }
    }

    #[tokio::test]
    async fn accepted_response_sends_exactly_once() {
        let calls = AtomicU32::new(0);

        deliver("01011112222", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(response("202")) }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_retried_exactly_once() {
        let calls = AtomicU32::new(0);

        let err = deliver("01011112222", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<SmsResponse, _>("Error sending SMS") }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(err.to_string(), "Error sending SMS");
    }

    #[tokio::test]
    async fn non_accepted_status_counts_as_failure() {
        let calls = AtomicU32::new(0);

        let err = deliver("01011112222", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(response("404")) }
        })
        .await
        .unwrap_err();

        // A 2xx transport result with a non-202 gateway status is still a
        // delivery failure, and it consumes both attempts
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn transient_failure_recovers_on_the_second_attempt() {
        let calls = AtomicU32::new(0);

        deliver("01011112222", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err("Error sending SMS")
                } else {
                    Ok(response("202"))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
