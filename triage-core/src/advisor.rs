//! Chat-completion client used for urgency scoring, narrative interpretation
//! and structured report generation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AdvisorConfig;
use crate::error::UpstreamError;

/// Budget for short classification-style prompts.
pub const SHORT_TIMEOUT: Duration = Duration::from_secs(15);
/// Budget for long analytical prompts.
pub const LONG_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBudget {
    Short,
    Long,
}

/// One prompt sent to the advisor.
#[derive(Debug, Clone)]
pub struct AdvisorRequest {
    pub system: String,
    /// Either a plain string or an array of multimodal content parts.
    pub content: Value,
    pub temperature: f32,
    pub max_tokens: u32,
    pub budget: TimeBudget,
    /// Overrides the configured text model, e.g. for vision prompts.
    pub model: Option<String>,
}

impl AdvisorRequest {
    pub fn text(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            content: Value::String(prompt.into()),
            temperature: 0.0,
            max_tokens: 256,
            budget: TimeBudget::Short,
            model: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn budget(mut self, budget: TimeBudget) -> Self {
        self.budget = budget;
        self
    }
}

/// Remote text generator. Implementations return the raw message text and
/// never inspect its shape.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn query(&self, request: AdvisorRequest) -> Result<String, UpstreamError>;
}

/// Advisor speaking the OpenAI-compatible chat-completion protocol.
pub struct ChatCompletionAdvisor {
    client: Client,
    config: AdvisorConfig,
    short_timeout: Duration,
    long_timeout: Duration,
}

impl ChatCompletionAdvisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            short_timeout: SHORT_TIMEOUT,
            long_timeout: LONG_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, short: Duration, long: Duration) -> Self {
        self.short_timeout = short;
        self.long_timeout = long;
        self
    }

    fn timeout_for(&self, budget: TimeBudget) -> Duration {
        match budget {
            TimeBudget::Short => self.short_timeout,
            TimeBudget::Long => self.long_timeout,
        }
    }

    fn build_payload(&self, request: &AdvisorRequest) -> Value {
        let model = request.model.as_deref().unwrap_or(&self.config.model);

        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(json!({ "role": "system", "content": request.system }));
        }
        messages.push(json!({ "role": "user", "content": request.content }));

        json!({
            "model": model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens
        })
    }
}

#[async_trait]
impl Advisor for ChatCompletionAdvisor {
    async fn query(&self, request: AdvisorRequest) -> Result<String, UpstreamError> {
        let timeout = self.timeout_for(request.budget);
        let payload = self.build_payload(&request);

        debug!(
            endpoint = %self.config.endpoint,
            max_tokens = request.max_tokens,
            ?timeout,
            "Sending advisor request"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Advisor request failed: {} {}", status, body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(UpstreamError::MissingContent)?;

        info!("Advisor returned {} characters", content.len());
        Ok(content.to_string())
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout(timeout)
    } else {
        UpstreamError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};

    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                "/ok",
                post(|| async {
                    Json(json!({
                        "choices": [{ "message": { "role": "assistant", "content": " medium " } }]
                    }))
                }),
            )
            .route(
                "/echo",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "choices": [{ "message": { "content": body.to_string() } }]
                    }))
                }),
            )
            .route(
                "/unavailable",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
            )
            .route(
                "/empty",
                post(|| async { Json(json!({ "choices": [] })) }),
            )
            .route(
                "/slow",
                post(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({ "choices": [{ "message": { "content": "late" } }] }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn advisor_for(base: &str, path: &str) -> ChatCompletionAdvisor {
        ChatCompletionAdvisor::new(AdvisorConfig {
            api_key: "test-key".to_string(),
            endpoint: format!("{}{}", base, path),
            model: "test-model".to_string(),
            ocr_model: "test-vision".to_string(),
        })
        .with_timeouts(Duration::from_millis(300), Duration::from_millis(600))
    }

    #[tokio::test]
    async fn test_returns_raw_content() {
        let base = spawn_upstream().await;
        let advisor = advisor_for(&base, "/ok");
        let text = advisor
            .query(AdvisorRequest::text("Medical AI", "urgency?"))
            .await
            .unwrap();
        assert_eq!(text, " medium ");
    }

    #[tokio::test]
    async fn test_payload_shape() {
        let base = spawn_upstream().await;
        let advisor = advisor_for(&base, "/echo");
        let text = advisor
            .query(
                AdvisorRequest::text("Medical AI", "hello")
                    .temperature(0.2)
                    .max_tokens(1500)
                    .budget(TimeBudget::Long),
            )
            .await
            .unwrap();
        let sent: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(sent["model"], "test-model");
        assert_eq!(sent["max_tokens"], 1500);
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][1]["content"], "hello");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let base = spawn_upstream().await;
        let err = advisor_for(&base, "/unavailable")
            .query(AdvisorRequest::text("", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_missing_content_is_upstream_error() {
        let base = spawn_upstream().await;
        let err = advisor_for(&base, "/empty")
            .query(AdvisorRequest::text("", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::MissingContent));
    }

    #[tokio::test]
    async fn test_timeout_is_upstream_error() {
        let base = spawn_upstream().await;
        let err = advisor_for(&base, "/slow")
            .query(AdvisorRequest::text("", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout(d) if d == Duration::from_millis(300)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = advisor_for(&format!("http://{}", addr), "/ok")
            .query(AdvisorRequest::text("", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Network(_)));
    }
}
