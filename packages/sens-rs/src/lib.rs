// NAVER Cloud Platform SENS SMS API client
// https://api.ncloud-docs.com/docs/ai-application-service-sens-smsv2

use base64::Engine as _;
use hmac::{Hmac, Mac};
use reqwest::{header, Client};
use sha2::Sha256;

pub mod models;

use crate::models::{SmsMessage, SmsRequest, SmsResponse};

type HmacSha256 = Hmac<Sha256>;

const SENS_ENDPOINT: &str = "https://sens.apigw.ntruss.com";

#[derive(Debug, Clone)]
pub struct SensOptions {
    pub access_key: String,
    pub secret_key: String,
    pub service_id: String,
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct SensService {
    options: SensOptions,
}

impl SensService {
    pub fn new(options: SensOptions) -> Self {
        Self { options }
    }

    /// Compute the `x-ncp-apigw-signature-v2` header value.
    ///
    /// Base64(HMAC-SHA256(secret_key, "POST {uri}\n{timestamp}\n{access_key}"))
    pub fn make_signature(&self, uri: &str, timestamp: &str) -> Result<String, &'static str> {
        let message = format!("POST {}\n{}\n{}", uri, timestamp, self.options.access_key);

        let mut mac = HmacSha256::new_from_slice(self.options.secret_key.as_bytes())
            .map_err(|_| "Invalid SENS secret key")?;
        mac.update(message.as_bytes());

        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Send a single SMS through SENS.
    ///
    /// `content_type` is the message category logged by SENS (e.g. a short
    /// label like "verification"); `body` is the text delivered to the phone.
    pub async fn send_sms(
        &self,
        recipient: &str,
        content_type: &str,
        body: &str,
    ) -> Result<SmsResponse, &'static str> {
        let uri = format!("/sms/v2/services/{}/messages", self.options.service_id);
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|_| "System clock before UNIX epoch")?
            .as_millis()
            .to_string();
        let signature = self.make_signature(&uri, &timestamp)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Content-Type",
            "application/json; charset=utf-8"
                .parse()
                .expect("Header value should parse correctly"),
        );
        headers.insert(
            "x-ncp-apigw-timestamp",
            timestamp.parse().map_err(|_| "Invalid timestamp header")?,
        );
        headers.insert(
            "x-ncp-iam-access-key",
            self.options
                .access_key
                .parse()
                .map_err(|_| "Invalid access key header")?,
        );
        headers.insert(
            "x-ncp-apigw-signature-v2",
            signature.parse().map_err(|_| "Invalid signature header")?,
        );

        let request = SmsRequest {
            message_type: "sms".to_string(),
            content_type: "COMM".to_string(),
            country_code: "82".to_string(),
            from: self.options.sender.clone(),
            content: content_type.to_string(),
            messages: vec![SmsMessage {
                to: recipient.to_string(),
                content: body.to_string(),
            }],
        };

        let url = format!("{}{}", SENS_ENDPOINT, uri);
        let client = Client::new();
        let res = client
            .post(url)
            .headers(headers)
            .json(&request)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("SENS error ({}): {}", status, error_body);
                    return Err("SENS returned an error");
                }

                match response.json::<SmsResponse>().await {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        eprintln!("Failed to parse SENS response: {}", e);
                        Err("Error parsing SMS response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to SENS failed: {}", e);
                Err("Error sending SMS")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SensService {
        SensService::new(SensOptions {
            access_key: "test-access-key".to_string(),
            secret_key: "test-secret-key".to_string(),
            service_id: "ncp:sms:kr:123:basecamp".to_string(),
            sender: "0290001111".to_string(),
        })
    }

    #[test]
    fn signature_is_deterministic_for_fixed_timestamp() {
        let svc = service();
        let uri = "/sms/v2/services/ncp:sms:kr:123:basecamp/messages";

        let a = svc.make_signature(uri, "1700000000000").unwrap();
        let b = svc.make_signature(uri, "1700000000000").unwrap();
        assert_eq!(a, b);

        let c = svc.make_signature(uri, "1700000000001").unwrap();
        assert_ne!(a, c, "Different timestamps must produce different signatures");
    }

    #[test]
    fn signature_is_valid_base64() {
        let svc = service();
        let sig = svc
            .make_signature("/sms/v2/services/x/messages", "1700000000000")
            .unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(sig)
            .unwrap();
        // HMAC-SHA256 digest is always 32 bytes
        assert_eq!(decoded.len(), 32);
    }
}
