//! Completion client — asks an OpenRouter-compatible chat completion endpoint
//! whether an item may travel in checked or carry-on baggage.
//!
//! Provides a `CompletionBackend` trait so the HTTP layer can be driven by a
//! fake in tests, and `OpenRouterClient`, the production implementation.
//! Transport failures are hard errors; a reachable endpoint that answers with
//! unreadable content yields `CompletionOutcome::Unparsable` instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::config::CompletionConfig;
use crate::error::ServiceError;
use crate::models::CompletionOutcome;

// ============================================================================
// CompletionBackend trait
// ============================================================================

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Ask about a single, already validated item.
    async fn complete(&self, item: &str) -> Result<CompletionOutcome, CompletionError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Malformed completion envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Missing API key")]
    MissingApiKey,
}

impl CompletionError {
    /// Timeouts, connection failures, rate limiting and 5xx are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionError::Http(e) => e.is_timeout() || e.is_connect(),
            CompletionError::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

impl From<CompletionError> for ServiceError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::MissingApiKey => {
                ServiceError::Configuration("OpenRouter API key not configured".to_string())
            }
            other => ServiceError::Upstream(format!("OpenRouter API error: {}", other)),
        }
    }
}

// ============================================================================
// Prompt
// ============================================================================

pub fn build_prompt(item: &str) -> String {
    format!(
        r#"You are a TSA (Transportation Security Administration) expert. For the item "{item}", provide information about:
1. Whether it's allowed in checked baggage (check-in)
2. Whether it's allowed in carry-on baggage
3. A brief description of any restrictions or important details

Respond ONLY with a valid JSON object in this exact format:
{{
    "check_in": true/false,
    "carry_on": true/false,
    "description": "Brief explanation of TSA rules and any restrictions"
}}

Base your response on official TSA guidelines. If uncertain, err on the side of caution: answer false and explain the relevant details in the description."#
    )
}

// ============================================================================
// OpenRouter API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: Option<u16>,
    message: String,
}

// ============================================================================
// OpenRouterClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    config: CompletionConfig,
    base_url: String,
}

impl OpenRouterClient {
    /// The API key is not required here; it is checked on every call so the
    /// service can start and report the misconfiguration per request.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let base_url = config.base_url.clone();
        Self::with_base_url(config, base_url)
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(
        config: CompletionConfig,
        base_url: String,
    ) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Send the prompt and return the raw text payload of the first choice.
    pub async fn complete_raw(&self, item: &str) -> Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;

        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        let prompt = build_prompt(item);

        RetryIf::spawn(
            retry_strategy,
            || self.complete_once(api_key, &prompt),
            |e: &CompletionError| {
                let retry = e.is_transient();
                if retry {
                    tracing::warn!(error = %e, "Transient completion failure, retrying");
                }
                retry
            },
        )
        .await
    }

    async fn complete_once(&self, api_key: &str, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("X-Title", &self.config.title)
            .json(&request);
        if let Some(referer) = &self.config.referer {
            builder = builder.header("HTTP-Referer", referer);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = match error_detail {
                Some(detail) => (detail.code.unwrap_or(status.as_u16()), detail.message),
                None => (status.as_u16(), error_body),
            };

            tracing::error!(code = code, message = %message, "OpenRouter API error");

            return Err(CompletionError::Api { code, message });
        }

        let body = response.text().await?;
        let envelope: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::MalformedEnvelope(e.to_string()))?;

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                CompletionError::MalformedEnvelope("no message content in choices".to_string())
            })
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(&self, item: &str) -> Result<CompletionOutcome, CompletionError> {
        let content = self.complete_raw(item).await?;
        Ok(CompletionOutcome::parse(&content))
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

// ============================================================================
// TESTS
// ============================================================================
