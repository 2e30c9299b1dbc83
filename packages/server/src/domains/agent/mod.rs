//! Agent domain - pass-through to the quiz analyzer.
//!
//! The analysis itself is an external capability; this domain only tags
//! each call with the authenticated principal in the usage log.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use crate::domains::auth::Principal;
use crate::domains::registry::models::{date_partition, datetime_stamp};
use crate::domains::registry::tables::TBL_AGENT_USAGE;
use crate::domains::registry::RegistryClient;
use crate::kernel::{BaseAnalyzer, QuizAnalysis};

pub struct QuizAgentService {
    analyzer: Arc<dyn BaseAnalyzer>,
    registry: Arc<RegistryClient>,
}

impl QuizAgentService {
    pub fn new(analyzer: Arc<dyn BaseAnalyzer>, registry: Arc<RegistryClient>) -> Self {
        Self { analyzer, registry }
    }

    /// Analyze one problem image on behalf of `principal` and log the
    /// token cost against their identity (best-effort).
    pub async fn analyze(&self, principal: &Principal, image: &[u8]) -> Result<QuizAnalysis> {
        let analysis = self.analyzer.analyze(image).await?;

        let now = Utc::now();
        let usage_row = vec![
            date_partition(now),
            datetime_stamp(now),
            principal.phone_number.clone(),
            principal.role.as_str().to_string(),
            analysis.usage_tokens.to_string(),
        ];
        if let Err(e) = self.registry.append_row(TBL_AGENT_USAGE, &usage_row).await {
            warn!(error = %e, "Failed to append agent usage row");
        }

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registry::AccessRole;
    use crate::kernel::test_dependencies::{MockAnalyzer, MockTabularStore};

    #[tokio::test]
    async fn analysis_is_tagged_in_the_usage_log() {
        let store = Arc::new(MockTabularStore::new());
        let analyzer = Arc::new(MockAnalyzer::new());
        let service = QuizAgentService::new(
            analyzer.clone(),
            Arc::new(RegistryClient::new(store.clone())),
        );

        let principal = Principal {
            phone_number: "01011112222".to_string(),
            role: AccessRole::Regular,
        };
        let analysis = service.analyze(&principal, b"png-bytes").await.unwrap();
        assert_eq!(analysis.answer, "3");
        assert_eq!(analyzer.calls(), vec![9]);

        let usage = store.appended_rows(TBL_AGENT_USAGE);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0][2], "01011112222");
        assert_eq!(usage[0][3], "일반(학생)");
        assert_eq!(usage[0][4], "1234");
    }

    #[tokio::test]
    async fn usage_log_failure_does_not_block_the_answer() {
        let store = Arc::new(MockTabularStore::new());
        store.set_fail(true);
        let service = QuizAgentService::new(
            Arc::new(MockAnalyzer::new()),
            Arc::new(RegistryClient::new(store)),
        );

        let principal = Principal {
            phone_number: "01011112222".to_string(),
            role: AccessRole::Regular,
        };
        let analysis = service.analyze(&principal, b"img").await.unwrap();
        assert_eq!(analysis.usage_tokens, 1234);
    }
}
