use std::time::Instant;

use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ProfilerError, Result};
use crate::traffic::{RequestRecord, TrafficLog};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Minimal Messages API client; every call lands in the traffic log.
#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    traffic: TrafficLog,
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        traffic: TrafficLog,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            traffic,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user prompt and return the concatenated text blocks.
    pub async fn complete(&self, label: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let url = format!("{}/v1/messages", self.api_base);
        let payload = ApiRequest {
            model: self.model.clone(),
            max_tokens,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };
        let body = serde_json::to_vec(&payload).map_err(|e| ProfilerError::MalformedResponse {
            phase: label.to_string(),
            details: format!("cannot encode request: {}", e),
        })?;
        let request_bytes = body.len();
        debug!("POST {} ({}, {} bytes)", url, label, request_bytes);

        let started = Instant::now();
        let finish = |status: Option<u16>, error: Option<String>| RequestRecord {
            label: label.to_string(),
            method: "POST".to_string(),
            url: url.clone(),
            request_bytes,
            status,
            error,
            duration_ms: started.elapsed().as_millis() as u64,
            at: Utc::now(),
        };

        let sent = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("anthropic-dangerous-direct-browser-access", "true")
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await;

        let resp = match sent {
            Ok(resp) => resp,
            Err(e) => {
                let message = e.to_string();
                self.traffic.record(finish(None, Some(message.clone()))).await;
                warn!("{} request failed: {}", label, message);
                return Err(ProfilerError::Network {
                    label: label.to_string(),
                    message,
                });
            }
        };

        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                let message = e.to_string();
                self.traffic
                    .record(finish(Some(status.as_u16()), Some(message.clone())))
                    .await;
                return Err(ProfilerError::Network {
                    label: label.to_string(),
                    message,
                });
            }
        };

        if !status.is_success() {
            let message = api_error_message(status, &text);
            self.traffic
                .record(finish(Some(status.as_u16()), Some(message.clone())))
                .await;
            warn!("{} request returned {}: {}", label, status, message);
            return Err(ProfilerError::ApiStatus {
                label: label.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        self.traffic.record(finish(Some(status.as_u16()), None)).await;

        let parsed: ApiResponse =
            serde_json::from_str(&text).map_err(|e| ProfilerError::MalformedResponse {
                phase: label.to_string(),
                details: format!("unexpected response envelope: {}", e),
            })?;

        Ok(parsed
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Minimal request checking that the endpoint accepts the credential.
    pub async fn validate_key(&self) -> Result<()> {
        self.complete("validate-key", "Hi", 1).await.map(|_| ())
    }
}

fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(parsed) => format!("{} ({})", parsed.error.message, parsed.error.r#type),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ApiMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse {
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContentBlock {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub r#type: String,
    pub message: String,
}
