/*!
 * Orchestrator scenarios run against the scripted mock provider
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use opensubtrans::errors::{BatchFailure, ProviderError, TranslationError};
use opensubtrans::providers::mock::{MockProvider, MockReply};
use opensubtrans::subtitle_processor::{parse_srt_string, to_srt_string};
use opensubtrans::translation::context::TermCategory;
use opensubtrans::translation::{
    BatchEvent, BatchOrchestrator, BatchState, CancellationToken, NoopProgress, OrchestratorOptions, ProgressSink,
};

use crate::common;

/// Counts retry notifications
#[derive(Default)]
struct RetryCounter {
    retries: AtomicUsize,
    completed: AtomicUsize,
}

impl ProgressSink for RetryCounter {
    fn batch_completed(&self, _event: &BatchEvent) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn batch_retrying(&self, _ordinal: usize, _attempt: u32, error: &ProviderError) {
        assert!(error.is_transient());
        self.retries.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_run_withTermInFirstBatch_shouldInjectItIntoLaterPrompts() {
    common::init_logging();
    let entries = parse_srt_string(common::SAMPLE_SRT).unwrap();
    let provider = Arc::new(MockProvider::working().with_term("Mary", "瑪麗", TermCategory::Name));
    let mut orchestrator = BatchOrchestrator::new(provider.clone(), common::fast_options());

    let outcome = orchestrator.run(&entries, 2, &CancellationToken::new(), &NoopProgress).await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].system.contains("Mary → 瑪麗"));
    assert!(requests[1].system.contains("Mary → 瑪麗"));
    assert_eq!(outcome.memory.lookup("mary").unwrap().target_term, "瑪麗");
    assert_eq!(outcome.translated[2].lines, vec!["[TRANSLATED] 瑪麗 is waiting.".to_string()]);
}

#[tokio::test]
async fn test_run_shouldPreserveTimingAndIndices() {
    let entries = common::numbered_entries(7);
    let provider = Arc::new(MockProvider::working().with_prefix("FR: "));
    let mut orchestrator = BatchOrchestrator::new(provider, common::fast_options());

    let outcome = orchestrator.run(&entries, 3, &CancellationToken::new(), &NoopProgress).await.unwrap();

    assert_eq!(outcome.translated.len(), entries.len());
    for (source, translated) in entries.iter().zip(&outcome.translated) {
        assert_eq!(source.seq_num, translated.seq_num);
        assert_eq!(source.start_time_ms, translated.start_time_ms);
        assert_eq!(source.end_time_ms, translated.end_time_ms);
        assert_eq!(translated.text(), format!("FR: {}", source.text()));
    }
    assert!(outcome.usage.total_tokens > 0);
}

#[tokio::test]
async fn test_run_withBlankLineInsideReply_shouldWriteReadableSrt() {
    let entries = common::numbered_entries(2);
    let provider = Arc::new(MockProvider::working().with_script(vec![MockReply::Text(
        "<<ENTRY_1>>\nBonjour\n\nà tous\n<<ENTRY_2>>\nMonde\n<<END>>".to_string(),
    )]));
    let mut orchestrator = BatchOrchestrator::new(provider, common::fast_options());

    let outcome = orchestrator.run(&entries, 2, &CancellationToken::new(), &NoopProgress).await.unwrap();

    let reparsed = parse_srt_string(&to_srt_string(&outcome.translated)).unwrap();
    assert_eq!(reparsed, outcome.translated);
    assert_eq!(reparsed[0].lines, vec!["Bonjour".to_string(), "à tous".to_string()]);
    assert_eq!(reparsed[1].start_time_ms, entries[1].start_time_ms);
}

#[tokio::test]
async fn test_run_withTwoTimeouts_shouldSucceedOnThirdAttempt() {
    common::init_logging();
    let entries = common::numbered_entries(3);
    let provider = Arc::new(MockProvider::working().with_script(vec![
        MockReply::Delay(Duration::from_secs(5)),
        MockReply::Delay(Duration::from_secs(5)),
    ]));
    let options = OrchestratorOptions {
        retry_count: 3,
        call_timeout: Duration::from_millis(50),
        ..common::fast_options()
    };
    let counter = RetryCounter::default();
    let mut orchestrator = BatchOrchestrator::new(provider.clone(), options);

    let outcome = orchestrator.run(&entries, 10, &CancellationToken::new(), &counter).await.unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.translated.len(), 3);
    assert_eq!(provider.request_count(), 3);
    assert_eq!(counter.retries.load(Ordering::SeqCst), 2);
    assert_eq!(counter.completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_withPersistentTimeouts_shouldAbortKeepingEarlierBatches() {
    let entries = common::numbered_entries(4);
    let slow = MockReply::Delay(Duration::from_secs(5));
    let provider = Arc::new(MockProvider::working().with_script(vec![
        MockReply::Echo,
        slow.clone(),
        slow.clone(),
        slow,
    ]));
    let options = OrchestratorOptions {
        retry_count: 2,
        call_timeout: Duration::from_millis(50),
        ..common::fast_options()
    };
    let mut orchestrator = BatchOrchestrator::new(provider.clone(), options);

    let result = orchestrator.run(&entries, 2, &CancellationToken::new(), &NoopProgress).await;

    let Err(TranslationError::RunAborted(aborted)) = result else {
        panic!("expected RunAborted, got {:?}", result.map(|o| o.status));
    };
    assert_eq!(aborted.failed_batch, 1);
    assert_eq!(aborted.attempts, 3);
    assert!(matches!(aborted.cause, BatchFailure::RetriesExhausted(ProviderError::Timeout(_))));
    assert_eq!(aborted.translated.iter().map(|c| c.seq_num).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(aborted.batch_states, vec![BatchState::Completed, BatchState::Failed]);
    assert_eq!(provider.request_count(), 4);
}

#[tokio::test]
async fn test_run_withRateLimit_shouldRetryAndSucceed() {
    let provider = Arc::new(MockProvider::working().with_script(vec![MockReply::Error(
        ProviderError::RateLimitExceeded("try later".to_string()),
    )]));
    let mut orchestrator = BatchOrchestrator::new(provider.clone(), common::fast_options());

    let outcome = orchestrator
        .run(&common::numbered_entries(2), 5, &CancellationToken::new(), &NoopProgress)
        .await
        .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_run_withMissingCueInResponse_shouldNotRetry() {
    let provider = Arc::new(MockProvider::working().with_script(vec![MockReply::Text(
        "<<ENTRY_1>>\nUn\n<<END>>".to_string(),
    )]));
    let mut orchestrator = BatchOrchestrator::new(provider.clone(), common::fast_options());

    let result = orchestrator
        .run(&common::numbered_entries(2), 2, &CancellationToken::new(), &NoopProgress)
        .await;

    let Err(TranslationError::RunAborted(aborted)) = result else {
        panic!("expected RunAborted");
    };
    assert_eq!(aborted.attempts, 1);
    assert!(aborted.translated.is_empty());
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_run_withEmptyModel_shouldFailBeforeAnyCall() {
    let provider = Arc::new(MockProvider::working());
    let options = OrchestratorOptions {
        model: String::new(),
        ..common::fast_options()
    };
    let mut orchestrator = BatchOrchestrator::new(provider.clone(), options);

    let result = orchestrator
        .run(&common::numbered_entries(2), 2, &CancellationToken::new(), &NoopProgress)
        .await;

    assert!(matches!(result, Err(TranslationError::Config(_))));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_run_withCancelledToken_shouldNotCallProvider() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let provider = Arc::new(MockProvider::working());
    let mut orchestrator = BatchOrchestrator::new(provider.clone(), common::fast_options());

    let outcome = orchestrator.run(&common::numbered_entries(4), 2, &cancel, &NoopProgress).await.unwrap();

    assert!(!outcome.is_complete());
    assert!(outcome.translated.is_empty());
    assert_eq!(outcome.batch_states, vec![BatchState::Pending; 2]);
    assert_eq!(provider.request_count(), 0);
}
