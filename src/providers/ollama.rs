use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use log::{debug, error, warn};

use crate::errors::ProviderError;
use super::{CompletionRequest, CompletionResponse, Provider, error_from_reqwest, error_from_status};

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Transport timeout of the HTTP client
    timeout: Duration,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant, or tool)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Build a non-streaming chat request from a provider-neutral one
    pub fn from_completion(request: &CompletionRequest) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage { role: "system".to_string(), content: request.system.clone() });
        }
        messages.push(ChatMessage { role: "user".to_string(), content: request.user.clone() });

        Self {
            model: request.model.clone(),
            messages,
            options: Some(GenerationOptions {
                temperature: request.temperature,
                num_predict: Some(request.max_tokens),
            }),
            stream: false,
        }
    }
}

/// Build a base URL with scheme and port from a configured host
pub fn base_url_from_host(host: &str, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        match host.split_once("://") {
            Some((scheme, host_part)) if !host_part.trim_end_matches('/').contains(':') => {
                format!("{}://{}:{}", scheme, host_part.trim_end_matches('/'), port)
            }
            _ => host.trim_end_matches('/').to_string(),
        }
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// Parse a chat reply that may arrive as a single object or as JSONL chunks
fn parse_chat_body(body: &str) -> Result<ChatResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<ChatResponse>(body) {
        return Ok(response);
    }

    warn!("Ollama reply is not a single JSON object, trying streamed chunks");

    let mut content = String::new();
    let mut prompt_eval_count = None;
    let mut eval_count = None;
    let mut parsed_any = false;

    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(chunk) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        parsed_any = true;

        if let Some(part) = chunk.get("message").and_then(|m| m.get("content")).and_then(|c| c.as_str()) {
            content.push_str(part);
        }
        if chunk.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
            prompt_eval_count = chunk.get("prompt_eval_count").and_then(|v| v.as_u64());
            eval_count = chunk.get("eval_count").and_then(|v| v.as_u64());
        }
    }

    if !parsed_any {
        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama API chat response. Raw response (first 500 chars): {}", preview);
        return Err(ProviderError::ParseError("Unparseable Ollama chat response".to_string()));
    }

    Ok(ChatResponse {
        message: ChatMessage { role: "assistant".to_string(), content },
        done: true,
        prompt_eval_count,
        eval_count,
    })
}

impl Ollama {
    /// Create a new Ollama client for a host and port
    pub fn new(host: impl AsRef<str>, port: u16, timeout: Duration) -> Self {
        Self::from_url(base_url_from_host(host.as_ref(), port), timeout)
    }

    /// Create a new Ollama client from a complete URL
    pub fn from_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: url.into(),
            client: Client::builder()
                .timeout(timeout)
                .http1_only()
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            timeout,
        }
    }

    /// Get the Ollama server version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);

        #[derive(Deserialize)]
        struct VersionResponse {
            version: String,
        }

        let response = self.client.get(&url)
            .send()
            .await
            .map_err(|e| error_from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_from_status(status.as_u16(), error_text));
        }

        response.json::<VersionResponse>().await
            .map(|v| v.version)
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!("Sending Ollama chat request for model {}", request.model);

        let response = self.client.post(&url)
            .json(&ChatRequest::from_completion(request))
            .send()
            .await
            .map_err(|e| error_from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(error_from_status(status.as_u16(), error_text));
        }

        let body = response.text().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to get response text from Ollama API: {}", e)))?;
        let chat = parse_chat_body(&body)?;

        Ok(CompletionResponse {
            text: chat.message.content,
            prompt_tokens: chat.prompt_eval_count,
            completion_tokens: chat.eval_count,
        })
    }

    async fn test_connection(&self, _model: &str) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        Ok(())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
