/*!
 * Context management for subtitle translation.
 *
 * This module keeps terminology consistent across batches:
 * - `memory`: the append-only store of established term translations
 * - `extraction`: heuristic proper-noun detection used for prompt hints
 */

pub mod extraction;
pub mod memory;

// Re-export main types
pub use extraction::{ExtractionConfig, TermExtractor};
pub use memory::{normalize_term, ConsistencyIssue, ContextMemory, ContextSummary, TermCategory, TermEntry};
