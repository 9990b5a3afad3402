//! Anthropic-backed responder.
//!
//! Calls the Anthropic messages API and asks the model to answer with a JSON
//! document matching [`StructuredResponse`]. Transient failures are retried
//! a bounded number of times here; the orchestrator itself never retries.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::dialog::StructuredResponse;
use crate::ports::{Responder, ResponderError, ResponderInfo, TurnContext};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Appended to every persona so the model answers in our wire format.
const RESPONSE_FORMAT_INSTRUCTIONS: &str = r#"
Respond with a single JSON object and nothing else, using this shape:
{
  "role": "<your role>",
  "state": "working" | "input-required" | "completed",
  "message": "<free text>",
  "actions": [
    {"kind": "request_info", "fields": ["..."]},
    {"kind": "request_docs", "items": ["..."]},
    {"kind": "provide_info", "data": {}},
    {"kind": "request_clarification", "question": "..."},
    {"kind": "propose_decision", "decision": "eligible" | "needs-more-info" | "ineligible", "rationale": "..."},
    {"kind": "accept_decision", "decision": "..."}
  ],
  "confidence": 0.0
}
Include only the actions you actually want to take."#;

/// Configuration for the Anthropic responder.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Responder backed by the Anthropic messages API.
pub struct AnthropicResponder {
    config: AnthropicConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    system: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

impl AnthropicResponder {
    /// Creates a new responder with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self, ResponderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ResponderError::transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    /// Builds the API request for a turn context.
    fn to_request(&self, ctx: &TurnContext) -> AnthropicRequest {
        let mut prompt = format!(
            "Shared facts:\n{}\n\nGuidelines in force:\n{}\n",
            serde_json::to_string_pretty(&ctx.facts).unwrap_or_default(),
            serde_json::to_string_pretty(&ctx.guidelines).unwrap_or_default(),
        );
        if ctx.recent_turns.is_empty() {
            prompt.push_str("\nThe dialog is just beginning; take the first turn.");
        } else {
            prompt.push_str("\nRecent turns, oldest first:\n");
            for response in &ctx.recent_turns {
                prompt.push_str(&format!(
                    "- {}: {}\n",
                    response.role,
                    serde_json::to_string(response).unwrap_or_default()
                ));
            }
            prompt.push_str("\nTake your turn now.");
        }

        AnthropicRequest {
            model: self.config.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            system: format!("{}\n{}", ctx.persona, RESPONSE_FORMAT_INSTRUCTIONS),
            max_tokens: 1024,
        }
    }

    async fn send(&self, request: &AnthropicRequest) -> Result<Response, ResponderError> {
        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResponderError::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    }
                } else if e.is_connect() {
                    ResponderError::transport(format!("connection failed: {}", e))
                } else {
                    ResponderError::transport(e.to_string())
                }
            })
    }

    async fn check_status(&self, response: Response) -> Result<Response, ResponderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 => Err(ResponderError::AuthenticationFailed),
            429 => Err(ResponderError::RateLimited {
                retry_after_secs: 30,
            }),
            400 => Err(ResponderError::malformed(format!("invalid request: {}", body))),
            500..=599 => Err(ResponderError::unavailable(format!(
                "server error {}: {}",
                status, body
            ))),
            _ => Err(ResponderError::transport(format!(
                "unexpected status {}: {}",
                status, body
            ))),
        }
    }

    async fn call_once(&self, ctx: &TurnContext) -> Result<StructuredResponse, ResponderError> {
        let request = self.to_request(ctx);
        let response = self.send(&request).await?;
        let response = self.check_status(response).await?;

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ResponderError::malformed(format!("invalid API response: {}", e)))?;
        let text = parsed
            .content
            .first()
            .map(|c| c.text.as_str())
            .unwrap_or_default();

        parse_structured_response(text, ctx)
    }
}

#[async_trait]
impl Responder for AnthropicResponder {
    async fn respond(&self, ctx: &TurnContext) -> Result<StructuredResponse, ResponderError> {
        let mut attempt = 0u32;
        loop {
            match self.call_once(ctx).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(%err, attempt, "responder call failed; retrying");
                    sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn info(&self) -> ResponderInfo {
        ResponderInfo::new("anthropic", self.config.model.clone())
    }
}

/// Parses the model's completion text into a structured response.
///
/// Tolerates markdown code fences and prose around the JSON document; the
/// reported role is forced to the requested one so a confused model cannot
/// speak for the other side.
fn parse_structured_response(
    text: &str,
    ctx: &TurnContext,
) -> Result<StructuredResponse, ResponderError> {
    let json = extract_json(text)
        .ok_or_else(|| ResponderError::malformed("no JSON object in completion"))?;
    let mut response: StructuredResponse = serde_json::from_str(json)
        .map_err(|e| ResponderError::malformed(format!("completion did not conform: {}", e)))?;

    if response.role != ctx.role {
        debug!(
            reported = %response.role,
            expected = %ctx.role,
            "responder reported the wrong role; correcting"
        );
        response.role = ctx.role;
    }
    response.confidence = response.confidence.clamp(0.0, 1.0);
    Ok(response)
}

/// Finds the JSON object embedded in completion text.
fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    (end > start).then(|| &inner[start..=end])
}
