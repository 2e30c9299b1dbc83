use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub sheets_bridge_url: String,
    pub sheets_bridge_api_key: Option<String>,
    pub analyzer_url: String,
    pub sens_access_key: String,
    pub sens_secret_key: String,
    pub sens_service_id: String,
    pub sens_sender: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            sheets_bridge_url: env::var("SHEETS_BRIDGE_URL")
                .context("SHEETS_BRIDGE_URL must be set")?,
            sheets_bridge_api_key: env::var("SHEETS_BRIDGE_API_KEY").ok(),
            analyzer_url: env::var("ANALYZER_URL")
                .context("ANALYZER_URL must be set")?,
            sens_access_key: env::var("NCP_ACCESS_KEY")
                .context("NCP_ACCESS_KEY must be set")?,
            sens_secret_key: env::var("NCP_SECRET_KEY")
                .context("NCP_SECRET_KEY must be set")?,
            sens_service_id: env::var("NCP_SMS_SVC_ID")
                .context("NCP_SMS_SVC_ID must be set")?,
            sens_sender: env::var("NCP_SMS_SENDER")
                .context("NCP_SMS_SENDER must be set")?,
        })
    }
}
