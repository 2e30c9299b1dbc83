//! HTTP client for the quiz analyzer service.
//!
//! The analyzer is an opaque collaborator: one POST with the problem image,
//! one structured result back. No analysis logic lives in this crate.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::kernel::{BaseAnalyzer, QuizAnalysis};

// Analysis calls run a vision model; allow well over the usual API budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HttpAnalyzer {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct AnalyzeRequest {
    image_base64: String,
}

impl HttpAnalyzer {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build analyzer HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BaseAnalyzer for HttpAnalyzer {
    async fn analyze(&self, image: &[u8]) -> Result<QuizAnalysis> {
        let request = AnalyzeRequest {
            image_base64: base64::engine::general_purpose::STANDARD.encode(image),
        };

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Analyzer request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Analyzer error ({}): {}", status, body));
        }

        response
            .json::<QuizAnalysis>()
            .await
            .context("Failed to parse analyzer response")
    }
}
