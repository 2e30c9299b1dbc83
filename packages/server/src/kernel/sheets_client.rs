//! HTTP client for the sheets bridge (registry backend).
//!
//! The registry lives in a spreadsheet exposed through a small REST bridge:
//!   GET  {base}/tables/{table}          -> { "rows": [ { col: value } ] }
//!   POST {base}/tables/{table}/rows     <- { "values": [ ... ] }
//!   POST {base}/tables/{table}/cells    <- { key_column, key, column, value }
//!
//! All transport and auth failures surface as plain errors here; the
//! registry client converts them into `RegistryError::Unavailable`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::kernel::{BaseTabularStore, TableRow};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SheetsBridgeClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ReadAllResponse {
    rows: Vec<TableRow>,
}

#[derive(Serialize)]
struct AppendRequest<'a> {
    values: &'a [String],
}

#[derive(Serialize)]
struct UpdateCellRequest<'a> {
    key_column: &'a str,
    key: &'a str,
    column: &'a str,
    value: &'a str,
}

impl SheetsBridgeClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build sheets bridge HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[async_trait]
impl BaseTabularStore for SheetsBridgeClient {
    async fn read_all(&self, table: &str) -> Result<Vec<TableRow>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/tables/{}", table))
            .send()
            .await
            .with_context(|| format!("Failed to read table {}", table))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Sheets bridge error ({}) reading {}: {}", status, table, body));
        }

        let parsed: ReadAllResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse rows of table {}", table))?;
        Ok(parsed.rows)
    }

    async fn append_row(&self, table: &str, row: &[String]) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, &format!("/tables/{}/rows", table))
            .json(&AppendRequest { values: row })
            .send()
            .await
            .with_context(|| format!("Failed to append to table {}", table))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Sheets bridge error ({}) appending to {}: {}", status, table, body));
        }
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
        let response = self
            .request(reqwest::Method::POST, &format!("/tables/{}/cells", table))
            .json(&UpdateCellRequest {
                key_column,
                key,
                column,
                value,
            })
            .send()
            .await
            .with_context(|| format!("Failed to update cell in table {}", table))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Sheets bridge error ({}) updating {}: {}", status, table, body));
        }
        Ok(())
    }
}
