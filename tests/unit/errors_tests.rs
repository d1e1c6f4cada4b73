/*!
 * Tests for error types and conversions
 */

use std::time::Duration;

use opensubtrans::errors::{
    AppError, BatchFailure, ConfigError, ProviderError, ResponseFormatError, RunAborted, SubtitleError,
    TranslationError,
};
use opensubtrans::translation::ContextMemory;

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_providerError_isTransient_shouldSeparateRetryableErrors() {
    assert!(ProviderError::Timeout(Duration::from_secs(1)).is_transient());
    assert!(ProviderError::RateLimitExceeded("slow down".into()).is_transient());
    assert!(ProviderError::ConnectionError("reset".into()).is_transient());
    assert!(ProviderError::ApiError { status_code: 503, message: String::new() }.is_transient());

    assert!(!ProviderError::AuthenticationError("bad key".into()).is_transient());
    assert!(!ProviderError::ParseError("not json".into()).is_transient());
    assert!(!ProviderError::ApiError { status_code: 400, message: String::new() }.is_transient());
}

#[test]
fn test_subtitleError_shouldNameTheLine() {
    let error = SubtitleError::MalformedTimestamp { line: 7, found: "00:00 -> 00:01".into() };
    assert!(error.to_string().starts_with("line 7"));
}

#[test]
fn test_translationError_fromConfigError_shouldWrap() {
    let error: TranslationError = ConfigError::InvalidBatchSize(0).into();
    assert!(matches!(error, TranslationError::Config(ConfigError::InvalidBatchSize(0))));
    assert!(error.to_string().contains("Batch size must be positive"));
}

#[test]
fn test_translationError_fromRunAborted_shouldBoxAndDescribe() {
    let aborted = RunAborted {
        failed_batch: 2,
        attempts: 4,
        cause: BatchFailure::RetriesExhausted(ProviderError::Timeout(Duration::from_millis(50))),
        translated: Vec::new(),
        memory: ContextMemory::new(),
        batch_states: Vec::new(),
    };

    let error: TranslationError = aborted.into();
    let message = error.to_string();
    assert!(message.contains("batch 2"));
    assert!(message.contains("4 attempt(s)"));
    assert!(matches!(error, TranslationError::RunAborted(a) if a.failed_batch == 2));
}

#[test]
fn test_batchFailure_fromResponseFormat_shouldWrap() {
    let failure: BatchFailure = ResponseFormatError::MissingEntry(3).into();
    assert_eq!(failure, BatchFailure::ResponseFormat(ResponseFormatError::MissingEntry(3)));
    assert!(failure.to_string().contains("cue 3"));
}

#[test]
fn test_appError_fromIoAndAnyhow_shouldConvert() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.srt");
    assert!(matches!(AppError::from(io_error), AppError::File(m) if m.contains("missing.srt")));

    let app_error: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(app_error, AppError::Unknown(m) if m == "boom"));

    let app_error: AppError = ConfigError::MissingModel("OpenAI".into()).into();
    assert!(app_error.to_string().contains("Configuration error"));
}
