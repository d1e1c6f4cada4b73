/*!
 * Sequential batch translation.
 *
 * The orchestrator walks the planned batches in ordinal order. For each one
 * it builds a prompt from the cues and the current context memory, calls the
 * provider under a timeout, parses the tagged reply, merges the reported
 * terms into the memory and writes the translated lines back. Batch `k + 1`
 * is only sent once batch `k` has been merged, so every prompt sees every
 * term established before it.
 *
 * Transient provider errors are retried with exponential backoff. Anything
 * else, or running out of retries, ends the run with a [`RunAborted`] that
 * carries the work completed so far.
 */

use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::errors::{BatchFailure, ConfigError, ProviderError, RunAborted, TranslationError};
use crate::providers::Provider;
use crate::subtitle_processor::SubtitleEntry;
use crate::translation::batch::{Batch, BatchPlanner};
use crate::translation::context::{ContextMemory, TermEntry, TermExtractor};
use crate::translation::core::TokenUsageStats;
use crate::translation::prompts::TranslationPromptBuilder;
use crate::translation::response::{BatchResponse, parse_batch_response};

/// Longest wait between two attempts of the same batch
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Lifecycle of one batch within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    InFlight,
    Completed,
    Failed,
}

/// Progress notification sent after each completed batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEvent {
    /// Ordinal of the completed batch
    pub ordinal: usize,

    /// Number of batches in the run
    pub total_batches: usize,

    /// Cues translated in this batch
    pub cues_translated: usize,

    /// Terms this batch added to the memory
    pub new_terms: Vec<TermEntry>,
}

/// Receiver of progress notifications.
///
/// Implementations must not block; the orchestrator calls them inline.
pub trait ProgressSink: Send + Sync {
    /// The run is about to start
    fn run_started(&self, _total_batches: usize, _total_cues: usize) {}

    /// A batch was translated and merged
    fn batch_completed(&self, event: &BatchEvent);

    /// A batch attempt failed with a transient error and will be retried
    fn batch_retrying(&self, _ordinal: usize, _attempt: u32, _error: &ProviderError) {}
}

/// Sink that discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn batch_completed(&self, _event: &BatchEvent) {}
}

impl ProgressSink for tokio::sync::mpsc::UnboundedSender<BatchEvent> {
    fn batch_completed(&self, event: &BatchEvent) {
        if self.send(event.clone()).is_err() {
            debug!("Progress receiver dropped, batch {} event discarded", event.ordinal);
        }
    }
}

/// Cooperative cancellation flag, checked between batches
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the batch in flight still finishes
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Settings for a translation run
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Model identifier sent to the provider
    pub model: String,

    /// Source language name, or empty / "auto" for detection
    pub source_language: String,

    /// Target language name as shown to the model
    pub target_language: String,

    /// Retries after the first attempt, for transient errors only
    pub retry_count: u32,

    /// Base backoff; attempt `n` waits `base * 2^(n-1)` ms
    pub backoff_base_ms: u64,

    /// Deadline for a single provider call
    pub call_timeout: Duration,

    pub temperature: Option<f32>,

    pub max_tokens: u32,

    /// Add detected proper nouns to the prompt
    pub hint_proper_nouns: bool,

    /// Optional cap on source characters per batch
    pub max_chars_per_batch: Option<usize>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            model: "gpt-5-mini".to_string(),
            source_language: String::new(),
            target_language: String::new(),
            retry_count: 3,
            backoff_base_ms: 1000,
            call_timeout: Duration::from_secs(120),
            temperature: None,
            max_tokens: 8192,
            hint_proper_nouns: true,
            max_chars_per_batch: None,
        }
    }
}

/// How a run that did not abort ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every batch was translated
    Completed,
    /// Cancelled before `next_batch` was sent
    Cancelled { next_batch: usize },
}

/// Result of a run that was not aborted
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,

    /// Translated cues of the batches completed by this run, in order
    pub translated: Vec<SubtitleEntry>,

    /// Context memory at the end of the run
    pub memory: ContextMemory,

    /// Final state of every planned batch
    pub batch_states: Vec<BatchState>,

    pub usage: TokenUsageStats,
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Runs batches through a provider one at a time
#[derive(Debug)]
pub struct BatchOrchestrator {
    provider: Arc<dyn Provider>,
    options: OrchestratorOptions,
    memory: ContextMemory,
    extractor: TermExtractor,
}

impl BatchOrchestrator {
    pub fn new(provider: Arc<dyn Provider>, options: OrchestratorOptions) -> Self {
        Self {
            provider,
            options,
            memory: ContextMemory::new(),
            extractor: TermExtractor::default(),
        }
    }

    /// Start from an existing memory (user glossary or a resumed run)
    pub fn with_memory(mut self, memory: ContextMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn memory(&self) -> &ContextMemory {
        &self.memory
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Translate every cue, batch by batch
    pub async fn run(
        &mut self,
        entries: &[SubtitleEntry],
        batch_size: i64,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<RunOutcome, TranslationError> {
        self.run_from(entries, batch_size, 0, cancel, progress).await
    }

    /// Translate the batches from ordinal `first_batch` on.
    ///
    /// Earlier batches are reported as `Completed` and contribute no cues to
    /// the outcome.
    pub async fn run_from(
        &mut self,
        entries: &[SubtitleEntry],
        batch_size: i64,
        first_batch: usize,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<RunOutcome, TranslationError> {
        self.validate_options()?;

        let batches = BatchPlanner::new(batch_size)?
            .with_max_chars(self.options.max_chars_per_batch)
            .plan(entries);
        let total = batches.len();

        let mut states: Vec<BatchState> = (0..total)
            .map(|i| if i < first_batch { BatchState::Completed } else { BatchState::Pending })
            .collect();
        let mut translated: Vec<SubtitleEntry> = Vec::new();
        let mut usage = TokenUsageStats::with_provider_info(
            self.provider.name().to_string(),
            self.options.model.clone(),
        );

        progress.run_started(total, entries.len());
        info!(
            "Translating {} cues in {} batches with {} ({})",
            entries.len(), total, self.options.model, self.provider.name()
        );

        for batch in batches.iter().skip(first_batch) {
            if cancel.is_cancelled() {
                info!("Cancelled before batch {}/{}", batch.ordinal + 1, total);
                return Ok(RunOutcome {
                    status: RunStatus::Cancelled { next_batch: batch.ordinal },
                    translated,
                    memory: self.memory.clone(),
                    batch_states: states,
                    usage,
                });
            }

            states[batch.ordinal] = BatchState::InFlight;
            debug!("Batch {}/{}: cues {:?}", batch.ordinal + 1, total, batch.seq_nums());

            match self.translate_batch(batch, &mut usage, progress).await {
                Ok(response) => {
                    let new_terms = self.merge(batch, response, &mut translated);
                    states[batch.ordinal] = BatchState::Completed;

                    progress.batch_completed(&BatchEvent {
                        ordinal: batch.ordinal,
                        total_batches: total,
                        cues_translated: batch.entries.len(),
                        new_terms,
                    });
                }
                Err((attempts, cause)) => {
                    states[batch.ordinal] = BatchState::Failed;
                    warn!("Batch {} failed after {} attempt(s): {}", batch.ordinal + 1, attempts, cause);

                    return Err(RunAborted {
                        failed_batch: batch.ordinal,
                        attempts,
                        cause,
                        translated,
                        memory: self.memory.clone(),
                        batch_states: states,
                    }
                    .into());
                }
            }
        }

        info!("Translation finished: {} terms in context memory", self.memory.len());

        Ok(RunOutcome {
            status: RunStatus::Completed,
            translated,
            memory: self.memory.clone(),
            batch_states: states,
            usage,
        })
    }

    fn validate_options(&self) -> Result<(), ConfigError> {
        if self.options.model.trim().is_empty() {
            return Err(ConfigError::MissingModel(self.provider.name().to_string()));
        }
        if self.options.target_language.trim().is_empty() {
            return Err(ConfigError::InvalidLanguage("target language is empty".to_string()));
        }
        Ok(())
    }

    /// Call the provider until the batch parses, retrying transient errors.
    ///
    /// On failure returns the number of attempts made and the cause.
    async fn translate_batch(
        &self,
        batch: &Batch,
        usage: &mut TokenUsageStats,
        progress: &dyn ProgressSink,
    ) -> Result<BatchResponse, (u32, BatchFailure)> {
        let request = self.build_prompt(batch).build_request(
            &self.options.model,
            self.options.temperature,
            self.options.max_tokens,
        );
        let expected = batch.seq_nums();
        let max_attempts = self.options.retry_count.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let started = Instant::now();
            let result = tokio::time::timeout(self.options.call_timeout, self.provider.complete(&request))
                .await
                .unwrap_or(Err(ProviderError::Timeout(self.options.call_timeout)));
            usage.api_duration += started.elapsed();

            let error = match result {
                Ok(response) => {
                    usage.add_token_usage(response.prompt_tokens, response.completion_tokens);
                    return parse_batch_response(&response.text, &expected)
                        .map_err(|e| (attempt, BatchFailure::ResponseFormat(e)));
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                return Err((attempt, BatchFailure::Provider(error)));
            }
            if attempt >= max_attempts {
                return Err((attempt, BatchFailure::RetriesExhausted(error)));
            }

            let backoff = backoff_delay(self.options.backoff_base_ms, attempt);
            warn!(
                "Batch {} attempt {}/{} failed: {}. Retrying in {:?}",
                batch.ordinal + 1, attempt, max_attempts, error, backoff
            );
            progress.batch_retrying(batch.ordinal, attempt, &error);
            tokio::time::sleep(backoff).await;
        }
    }

    fn build_prompt(&self, batch: &Batch) -> TranslationPromptBuilder {
        let mut builder = TranslationPromptBuilder::new(&self.options.source_language, &self.options.target_language)
            .with_memory(&self.memory)
            .with_entries(&batch.entries);

        if self.options.hint_proper_nouns {
            let texts: Vec<String> = batch.entries.iter().map(|e| e.text()).collect();
            let hints: Vec<String> = self
                .extractor
                .extract(&texts)
                .into_iter()
                .filter(|term| self.memory.lookup(term).is_none())
                .collect();
            builder = builder.with_term_hints(hints);
        }

        builder
    }

    /// Apply a parsed batch: check drift, upsert terms, write back cue text
    fn merge(&mut self, batch: &Batch, response: BatchResponse, translated: &mut Vec<SubtitleEntry>) -> Vec<TermEntry> {
        let BatchResponse { mut entries, terms } = response;

        for cue in &batch.entries {
            let lines = entries.remove(&cue.seq_num).unwrap_or_default();

            for issue in self.memory.check_consistency(&cue.text(), &lines.join("\n")) {
                warn!("Cue {}: {}", cue.seq_num, issue.description());
            }

            translated.push(SubtitleEntry { lines, ..cue.clone() });
        }

        let new_terms = self.memory.upsert(terms);
        if !new_terms.is_empty() {
            debug!("Batch {} established {} new term(s)", batch.ordinal + 1, new_terms.len());
        }
        new_terms
    }
}

/// Wait before retry number `attempt` (1-based), capped at [`MAX_BACKOFF_MS`]
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(20);
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}
