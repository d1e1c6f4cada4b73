/*!
 * Error types for the opensubtrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;
use thiserror::Error;

use crate::subtitle_processor::SubtitleEntry;
use crate::translation::context::ContextMemory;
use crate::translation::orchestrator::BatchState;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not complete within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Whether a retry with the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimitExceeded(_) | Self::ConnectionError(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::RequestFailed(_) | Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Malformed SRT input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    #[error("line {line}: expected a cue index, found '{found}'")]
    MissingIndex { line: usize, found: String },

    #[error("line {line}: malformed timestamp line '{found}'")]
    MalformedTimestamp { line: usize, found: String },

    #[error("line {line}: cue index {found} does not follow {previous}")]
    IndexNotIncreasing {
        line: usize,
        previous: usize,
        found: usize,
    },

    #[error("cue {index}: end time must be after start time")]
    InvalidTimeRange { index: usize },

    #[error("cue {index} has no text")]
    MissingText { index: usize },
}

/// Invalid settings, rejected before any network call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Batch size must be positive, got {0}")]
    InvalidBatchSize(i64),

    #[error("No model configured for provider {0}")]
    MissingModel(String),

    #[error("No pricing known for model '{0}'")]
    UnknownModel(String),

    #[error("API key is required for {0} provider")]
    MissingApiKey(String),

    #[error("Invalid language: '{0}'")]
    InvalidLanguage(String),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid provider type: {0}")]
    InvalidProvider(String),
}

/// A provider answered, but the answer does not follow the tagged format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormatError {
    #[error("response is empty")]
    Empty,

    #[error("response has no <<END>> marker (truncated?)")]
    MissingEndMarker,

    #[error("no translation returned for cue {0}")]
    MissingEntry(usize),

    #[error("cue {0} appears more than once in the response")]
    DuplicateEntry(usize),

    #[error("response contains cue {0}, which was not requested")]
    UnexpectedEntry(usize),

    #[error("translation for cue {0} is empty")]
    EmptyEntry(usize),

    #[error("entry tag '{0}' does not name a cue")]
    InvalidEntryTag(String),
}

/// Why a batch could not be completed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchFailure {
    /// Transient errors persisted through every allowed attempt
    #[error("gave up after retries: {0}")]
    RetriesExhausted(ProviderError),

    /// The provider reported an error that retrying cannot fix
    #[error("provider error: {0}")]
    Provider(ProviderError),

    /// The provider answered with something we cannot map back to cues
    #[error("malformed response: {0}")]
    ResponseFormat(#[from] ResponseFormatError),
}

/// Terminal failure of a run, carrying everything completed before it.
#[derive(Error, Debug, Clone)]
#[error("translation aborted at batch {failed_batch} after {attempts} attempt(s): {cause}")]
pub struct RunAborted {
    /// Ordinal of the batch that failed
    pub failed_batch: usize,

    /// Number of provider calls made for the failed batch
    pub attempts: u32,

    /// What went wrong
    pub cause: BatchFailure,

    /// Translated cues of every batch completed before the failure
    pub translated: Vec<SubtitleEntry>,

    /// Context memory as it stood after the last completed batch
    pub memory: ContextMemory,

    /// Final state of each planned batch
    pub batch_states: Vec<BatchState>,
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Invalid settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unusable provider response
    #[error("Response format error: {0}")]
    ResponseFormat(#[from] ResponseFormatError),

    /// The run stopped part way
    #[error("{0}")]
    RunAborted(Box<RunAborted>),
}

impl From<RunAborted> for TranslationError {
    fn from(aborted: RunAborted) -> Self {
        Self::RunAborted(Box::new(aborted))
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
