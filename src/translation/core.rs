/*!
 * Translation service wiring.
 *
 * Turns the translation section of the configuration into a concrete
 * provider client and the options of a batch orchestrator, and keeps the
 * token usage bookkeeping shared by every run.
 */

use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::{ConfigError, ProviderError};
use crate::providers::Provider;
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use crate::translation::orchestrator::{BatchOrchestrator, OrchestratorOptions};

/// Token usage statistics for tracking API consumption
#[derive(Debug, Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenUsageStats {
    pub fn new() -> Self {
        Self::with_provider_info(String::new(), String::new())
    }

    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Add the usage reported by one response; missing counts are skipped
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        let elapsed_minutes = self.start_time.elapsed().as_secs_f64() / 60.0;
        let api_minutes = self.api_duration.as_secs_f64() / 60.0;

        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider,
            self.model,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            elapsed_minutes,
            api_minutes,
            self.tokens_per_minute()
        )
    }
}

/// Provider client plus the settings every run shares
#[derive(Debug, Clone)]
pub struct TranslationService {
    provider: Arc<dyn Provider>,

    /// Configuration for the translation service
    pub config: TranslationConfig,
}

impl TranslationService {
    /// Create the provider client selected by the configuration
    pub fn new(config: TranslationConfig) -> Result<Self, ConfigError> {
        let endpoint = config.get_endpoint();
        Url::parse(&endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        let timeout = config.get_timeout();
        let provider: Arc<dyn Provider> = match config.provider {
            ConfigTranslationProvider::OpenAI => Arc::new(OpenAI::new(config.get_api_key(), endpoint, timeout)),
            ConfigTranslationProvider::LMStudio => {
                Arc::new(OpenAI::compatible(config.get_api_key(), endpoint, timeout))
            }
            ConfigTranslationProvider::Anthropic => {
                Arc::new(Anthropic::new(config.get_api_key(), endpoint, timeout))
            }
            ConfigTranslationProvider::Ollama => Arc::new(Ollama::from_url(endpoint, timeout)),
        };

        debug!("Created {} client for model {}", provider.name(), config.get_model());
        Ok(Self { provider, config })
    }

    /// Use an already built provider, such as a mock
    pub fn with_provider(provider: Arc<dyn Provider>, config: TranslationConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> Arc<dyn Provider> {
        Arc::clone(&self.provider)
    }

    /// Check that the provider is reachable with the configured credentials
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        let model = self.config.get_model();
        info!("Testing connection to {} with model {}", self.config.provider.display_name(), model);
        self.provider.test_connection(&model).await
    }

    /// Run options for the given language names
    pub fn orchestrator_options(&self, source_language: &str, target_language: &str) -> OrchestratorOptions {
        let common = &self.config.common;
        OrchestratorOptions {
            model: self.config.get_model(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            retry_count: common.retry_count,
            backoff_base_ms: common.retry_backoff_ms,
            call_timeout: self.config.get_timeout(),
            temperature: common.temperature,
            max_tokens: common.max_tokens,
            hint_proper_nouns: common.hint_proper_nouns,
            max_chars_per_batch: common.max_chars_per_batch,
        }
    }

    /// A fresh orchestrator with an empty context memory
    pub fn orchestrator(&self, source_language: &str, target_language: &str) -> BatchOrchestrator {
        BatchOrchestrator::new(self.provider(), self.orchestrator_options(source_language, target_language))
    }
}
