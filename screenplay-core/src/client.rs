use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ApiKey;
use crate::error::{Result, ScreenplayError};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const RESPONSE_HEALING_PLUGIN: &str = "response-healing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,
}

/// Chat-completion request body in OpenRouter wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: Value,
    pub plugins: Vec<Plugin>,
    pub stream: bool,
}

impl CompletionRequest {
    /// Single user message, structured output, response healing, no streaming.
    pub fn structured(model: impl Into<String>, prompt: impl Into<String>, format: Value) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            response_format: to_wire_format(format),
            plugins: vec![Plugin {
                id: RESPONSE_HEALING_PLUGIN.to_string(),
            }],
            stream: false,
        }
    }
}

/// Renames the SDK-style `jsonSchema` key to the REST `json_schema` key.
/// Documents already using `json_schema` pass through unchanged.
pub fn to_wire_format(mut format: Value) -> Value {
    if let Some(object) = format.as_object_mut() {
        if !object.contains_key("json_schema") {
            if let Some(schema) = object.remove("jsonSchema") {
                object.insert("json_schema".to_string(), schema);
            }
        }
    }
    format
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Text content of the first choice.
    pub fn first_content(&self) -> Result<&str> {
        let choice = self.choices.first().ok_or_else(|| {
            ScreenplayError::MalformedCompletion("response has no choices".to_string())
        })?;
        choice.message.content.as_deref().ok_or_else(|| {
            ScreenplayError::MalformedCompletion("first choice has no message content".to_string())
        })
    }
}

/// Anything that can run a chat completion on behalf of a caller-supplied key.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        api_key: &ApiKey,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse>;
}

#[derive(Debug, Clone, Default)]
pub struct OpenRouterOptions {
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    /// Sent as `HTTP-Referer` for OpenRouter app attribution.
    pub referer: Option<String>,
    /// Sent as `X-Title`.
    pub title: Option<String>,
}

/// [`CompletionClient`] talking to the OpenRouter HTTP API.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    base_url: String,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenRouterClient {
    pub fn new(options: OpenRouterOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: options
                .base_url
                .unwrap_or_else(|| OPENROUTER_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            referer: options.referer,
            title: options.title,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(
        &self,
        api_key: &ApiKey,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %request.model, url = %url, "Sending chat completion");

        let mut builder = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.expose()))
            .json(request);
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to read OpenRouter error body");
                    String::new()
                }
            };
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            error!(status = %status, "OpenRouter request failed");
            return Err(ScreenplayError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ScreenplayError::MalformedCompletion(format!("invalid completion body: {}", e))
        })
    }
}
