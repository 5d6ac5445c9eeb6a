use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ForwarderConfig;
use crate::parser::ParsedOtp;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What the receiver endpoint did with a forwarded OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    Delivered { delivered_to: String },
    Rejected { message: String },
}

/// Sink for parsed OTPs. The monitor loop is written against this
/// trait so its policy can be tested without a live endpoint.
#[async_trait]
pub trait Forward {
    async fn forward(&self, otp: &ParsedOtp, raw_message: &str) -> Result<ForwardOutcome>;
}

#[derive(Debug, Serialize)]
struct OtpPayload<'a> {
    phone_number: &'a str,
    otp_code: &'a str,
    raw_message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ForwardResponse {
    success: bool,
    delivered_to: Option<String>,
    message: Option<String>,
}

/// HTTP forwarder posting OTPs to the configured receiver endpoint.
pub struct Forwarder {
    client: reqwest::Client,
    config: ForwarderConfig,
}

impl Forwarder {
    pub fn new(config: ForwarderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Forward for Forwarder {
    async fn forward(&self, otp: &ParsedOtp, raw_message: &str) -> Result<ForwardOutcome> {
        let payload = OtpPayload {
            phone_number: &otp.phone_number,
            otp_code: &otp.otp_code,
            raw_message,
        };

        debug!("Forwarding OTP to {}", self.config.endpoint_url);

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.secret_token),
            )
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .context("Failed to send OTP to receiver endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Receiver endpoint error ({}): {}", status, error_body);
        }

        let parsed: ForwardResponse = response
            .json()
            .await
            .context("Failed to parse receiver response")?;

        if parsed.success {
            Ok(ForwardOutcome::Delivered {
                delivered_to: parsed.delivered_to.unwrap_or_else(|| "unknown".to_string()),
            })
        } else {
            Ok(ForwardOutcome::Rejected {
                message: parsed
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_format() {
        let payload = OtpPayload {
            phone_number: "+12025550199",
            otp_code: "834921",
            raw_message: "Your OTP for +1 202 555 0199 is 834921",
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["phone_number"], "+12025550199");
        assert_eq!(value["otp_code"], "834921");
        assert_eq!(
            value["raw_message"],
            "Your OTP for +1 202 555 0199 is 834921"
        );
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_response_decoding() {
        let ok: ForwardResponse =
            serde_json::from_str(r#"{"success": true, "delivered_to": "user-42"}"#).unwrap();
        assert!(ok.success);
        assert_eq!(ok.delivered_to.as_deref(), Some("user-42"));
        assert!(ok.message.is_none());

        let rejected: ForwardResponse =
            serde_json::from_str(r#"{"success": false, "message": "no subscriber"}"#).unwrap();
        assert!(!rejected.success);
        assert_eq!(rejected.message.as_deref(), Some("no subscriber"));
    }
}
