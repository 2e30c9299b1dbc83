use serde::{Deserialize, Serialize};

/// SENS SMS send request body
#[derive(Debug, Clone, Serialize)]
pub struct SmsRequest {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(rename = "countryCode")]
    pub country_code: String,
    pub from: String,
    pub content: String,
    pub messages: Vec<SmsMessage>,
}

/// One recipient within a send request
#[derive(Debug, Clone, Serialize)]
pub struct SmsMessage {
    pub to: String,
    pub content: String,
}

/// SENS SMS send response
///
/// `status_code` is "202" when the message was accepted for delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "requestTime")]
    pub request_time: String,
    #[serde(rename = "statusCode")]
    pub status_code: String,
    #[serde(rename = "statusName")]
    pub status_name: String,
}

impl SmsResponse {
    pub fn accepted(&self) -> bool {
        self.status_code == "202"
    }
}
