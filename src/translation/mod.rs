/*!
 * Subtitle translation with a language model.
 *
 * This module contains the core functionality for translating subtitles
 * batch by batch. It is split into several submodules:
 *
 * - `batch`: Splitting cues into ordered batches
 * - `context`: Context memory of established term translations
 * - `core`: Provider wiring and token usage bookkeeping
 * - `cost`: Up-front cost estimation
 * - `orchestrator`: Sequential batch execution with retries
 * - `prompts`: Prompt templates and builders for translation
 * - `response`: Parsing of tagged model replies
 */

// Re-export main types for easier usage
pub use self::batch::{Batch, BatchPlanner, DEFAULT_BATCH_SIZE};
pub use self::context::{ContextMemory, TermCategory, TermEntry};
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::cost::{CostEstimate, CostEstimator, ModelPricing, PricingTable};
pub use self::orchestrator::{
    BatchEvent, BatchOrchestrator, BatchState, CancellationToken, NoopProgress, OrchestratorOptions,
    ProgressSink, RunOutcome, RunStatus,
};

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod batch;
pub mod context;
pub mod core;
pub mod cost;
pub mod orchestrator;
pub mod prompts;
pub mod response;
