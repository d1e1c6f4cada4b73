use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::{debug, error};

use crate::errors::ProviderError;
use super::{CompletionRequest, CompletionResponse, Provider, error_from_reqwest, error_from_status};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Client for the OpenAI chat completions API and compatible servers
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication (may be empty for local servers)
    api_key: String,
    /// API base URL, including the version segment
    endpoint: String,
    /// Send `max_tokens` instead of `max_completion_tokens`
    compatible_mode: bool,
    /// Transport timeout of the HTTP client
    timeout: Duration,
}

/// Chat completions request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    pub usage: Option<OpenAIUsage>,
}

impl OpenAIRequest {
    /// Build the wire request from a provider-neutral one
    pub fn from_completion(request: &CompletionRequest, compatible_mode: bool) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(OpenAIMessage { role: "system".to_string(), content: Some(request.system.clone()) });
        }
        messages.push(OpenAIMessage { role: "user".to_string(), content: Some(request.user.clone()) });

        let (max_completion_tokens, max_tokens) = if compatible_mode {
            (None, Some(request.max_tokens))
        } else {
            (Some(request.max_tokens), None)
        };

        Self {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_completion_tokens,
            max_tokens,
        }
    }
}

impl OpenAI {
    /// Create a client for the OpenAI API
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            compatible_mode: false,
            timeout,
        }
    }

    /// Create a client for an OpenAI-compatible local server such as LM Studio
    pub fn compatible(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self { compatible_mode: true, ..Self::new(api_key, endpoint, timeout) }
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() { DEFAULT_ENDPOINT } else { self.endpoint.as_str() };
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = OpenAIRequest::from_completion(request, self.compatible_mode);
        debug!("Sending chat completion request for model {}", request.model);

        let mut builder = self.client.post(self.api_url()).json(&body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send()
            .await
            .map_err(|e| error_from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI-compatible API error ({}): {}", status, error_text);
            return Err(error_from_status(status.as_u16(), error_text));
        }

        let parsed = response.json::<OpenAIResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse chat completion response: {}", e)))?;

        let text = parsed.choices.into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::ParseError("Chat completion response has no content".to_string()))?;

        Ok(CompletionResponse {
            text,
            prompt_tokens: parsed.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: parsed.usage.as_ref().map(|u| u.completion_tokens),
        })
    }

    fn name(&self) -> &str {
        if self.compatible_mode { "lmstudio" } else { "openai" }
    }
}
