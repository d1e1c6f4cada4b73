/*!
 * Up-front cost estimation.
 *
 * Token counts are approximated from character counts: about four characters
 * per token for English text and three for other languages. Each batch
 * repeats the instructions and the context memory, so for the same cues a
 * smaller batch size gives a higher estimate.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::ConfigError;
use crate::subtitle_processor::SubtitleEntry;
use crate::translation::batch::batch_count_with_budget;

/// Tokens for the `<<ENTRY_n>>` tag around each cue, both directions
pub const PER_CUE_TAG_TOKENS: u64 = 6;

/// Tokens for the system prompt plus a reserve for the context memory
pub const PER_BATCH_PROMPT_TOKENS: u64 = 450;

/// Tokens for the term section and end marker of each reply
pub const PER_BATCH_TERMS_TOKENS: u64 = 40;

/// Smallest non-zero cost reported
pub const MIN_DISPLAY_COST: f64 = 0.000_001;

/// Price of a model in USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self { input_per_million, output_per_million }
    }
}

/// Model id -> pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingTable {
    models: BTreeMap<String, ModelPricing>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert("gpt-5".to_string(), ModelPricing::new(1.25, 10.00));
        models.insert("gpt-5-mini".to_string(), ModelPricing::new(0.25, 2.00));
        Self { models }
    }
}

impl PricingTable {
    /// A table without any model
    pub fn empty() -> Self {
        Self { models: BTreeMap::new() }
    }

    pub fn insert(&mut self, model: &str, pricing: ModelPricing) {
        self.models.insert(model.to_string(), pricing);
    }

    /// Pricing of a model; unknown models are an error
    pub fn get(&self, model: &str) -> Result<&ModelPricing, ConfigError> {
        self.models
            .get(model)
            .ok_or_else(|| ConfigError::UnknownModel(model.to_string()))
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|k| k.as_str())
    }

    /// Add entries from `other`, replacing prices of models present in both
    pub fn merge(&mut self, other: &PricingTable) {
        for (model, pricing) in &other.models {
            self.models.insert(model.clone(), *pricing);
        }
    }
}

/// Estimated token counts and cost of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub model: String,
    pub pricing: ModelPricing,
    pub total_characters: usize,
    pub total_texts: usize,
    pub batch_count: usize,
    pub estimated_input_tokens: u64,
    pub estimated_output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cost Estimate:")?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Subtitles: {} ({} characters)", self.total_texts, self.total_characters)?;
        writeln!(f, "  Batches: {}", self.batch_count)?;
        writeln!(f, "  Input tokens: ~{}", self.estimated_input_tokens)?;
        writeln!(f, "  Output tokens: ~{}", self.estimated_output_tokens)?;
        write!(f, "  Estimated cost: ${:.6}", self.total_cost)
    }
}

/// Pure estimator for one target language
#[derive(Debug, Clone)]
pub struct CostEstimator {
    output_chars_per_token: u64,
    max_chars_per_batch: Option<usize>,
}

impl CostEstimator {
    pub fn new(target_language: &str) -> Self {
        let target = target_language.trim().to_lowercase();
        let english = target.contains("english") || target == "en" || target == "eng";
        Self {
            output_chars_per_token: if english { 4 } else { 3 },
            max_chars_per_batch: None,
        }
    }

    /// Count batches the way a planner with this character budget splits them
    pub fn with_max_chars(mut self, max_chars_per_batch: Option<usize>) -> Self {
        self.max_chars_per_batch = max_chars_per_batch;
        self
    }

    /// Estimate a run over `entries`; a batch size of 0 counts as 1
    pub fn estimate(
        &self,
        entries: &[SubtitleEntry],
        model: &str,
        pricing: &ModelPricing,
        batch_size: usize,
    ) -> CostEstimate {
        let total_characters: usize = entries.iter().map(|e| e.char_count()).sum();
        let total_texts = entries.iter().filter(|e| e.char_count() > 0).count();

        if total_characters == 0 {
            return CostEstimate {
                model: model.to_string(),
                pricing: *pricing,
                total_characters: 0,
                total_texts: 0,
                batch_count: 0,
                estimated_input_tokens: 0,
                estimated_output_tokens: 0,
                input_cost: 0.0,
                output_cost: 0.0,
                total_cost: 0.0,
            };
        }

        let batches = batch_count_with_budget(entries, batch_size, self.max_chars_per_batch);
        let chars = total_characters as u64;
        let cues = entries.len() as u64;

        let estimated_input_tokens =
            chars.div_ceil(4) + cues * PER_CUE_TAG_TOKENS + batches as u64 * PER_BATCH_PROMPT_TOKENS;
        let estimated_output_tokens = chars.div_ceil(self.output_chars_per_token)
            + cues * PER_CUE_TAG_TOKENS
            + batches as u64 * PER_BATCH_TERMS_TOKENS;

        let input_cost = estimated_input_tokens as f64 / 1_000_000.0 * pricing.input_per_million;
        let output_cost = estimated_output_tokens as f64 / 1_000_000.0 * pricing.output_per_million;

        CostEstimate {
            model: model.to_string(),
            pricing: *pricing,
            total_characters,
            total_texts,
            batch_count: batches,
            estimated_input_tokens,
            estimated_output_tokens,
            input_cost,
            output_cost,
            total_cost: (input_cost + output_cost).max(MIN_DISPLAY_COST),
        }
    }

    /// Look the model up in `table`, then estimate
    pub fn estimate_with_table(
        &self,
        entries: &[SubtitleEntry],
        table: &PricingTable,
        model: &str,
        batch_size: usize,
    ) -> Result<CostEstimate, ConfigError> {
        let pricing = table.get(model)?;
        Ok(self.estimate(entries, model, pricing, batch_size))
    }
}
