/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: OpenAI API and OpenAI-compatible servers (LM Studio)
 * - Anthropic: Anthropic API integration
 * - Ollama: Local LLM server
 * - Mock: scripted provider for tests and dry runs
 *
 * Clients make exactly one HTTP call per `complete`; retrying, backoff and
 * timeouts belong to the orchestrator.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A provider-neutral chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// System instructions
    pub system: String,

    /// User message
    pub user: String,

    /// Sampling temperature, when the model accepts one
    pub temperature: Option<f32>,

    /// Upper bound for generated tokens
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            temperature: None,
            max_tokens: 4096,
        }
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text returned by a provider, with token usage when reported
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionResponse {
    pub text: String,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This is the translation capability consumed by the orchestrator. It is
/// object safe so the configured provider can be held as `Arc<dyn Provider>`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self, model: &str) -> Result<(), ProviderError> {
        let request = CompletionRequest::new(model, "Reply with OK.", "Hello").max_tokens(10);
        self.complete(&request).await.map(|_| ())
    }

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn error_from_status(status: u16, body: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        _ => ProviderError::ApiError { status_code: status, message: body },
    }
}

/// Map a transport failure to a provider error
pub(crate) fn error_from_reqwest(error: reqwest::Error, timeout: std::time::Duration) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout)
    } else if error.is_connect() || error.is_request() {
        ProviderError::ConnectionError(error.to_string())
    } else if error.is_decode() {
        ProviderError::ParseError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
