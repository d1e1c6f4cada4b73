/*!
 * Batch planning.
 *
 * Splits the ordered cue sequence into contiguous, non-overlapping batches.
 * Concatenating the batches in ordinal order always yields the input
 * sequence unchanged.
 */

use log::{debug, error};

use crate::errors::ConfigError;
use crate::subtitle_processor::SubtitleEntry;

/// Number of cues per request when nothing else is configured
pub const DEFAULT_BATCH_SIZE: i64 = 12;

/// A contiguous group of cues sent together in one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position of this batch in the run, starting at 0
    pub ordinal: usize,

    /// Cues of this batch, in source order
    pub entries: Vec<SubtitleEntry>,
}

impl Batch {
    /// Total characters of source text in this batch
    pub fn char_count(&self) -> usize {
        self.entries.iter().map(|e| e.char_count()).sum()
    }

    /// Cue indices contained in this batch
    pub fn seq_nums(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.seq_num).collect()
    }
}

/// Planner for splitting cues into batches
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    /// Maximum number of cues per batch
    batch_size: usize,

    /// Optional cap on the source characters per batch
    max_chars: Option<usize>,
}

impl BatchPlanner {
    /// Create a planner; a batch size of zero or less is rejected
    pub fn new(batch_size: i64) -> Result<Self, ConfigError> {
        if batch_size <= 0 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }

        Ok(Self {
            batch_size: batch_size as usize,
            max_chars: None,
        })
    }

    /// Also close a batch before its text would exceed `max_chars`
    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars.filter(|&c| c > 0);
        self
    }

    /// Maximum number of cues per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Split cues into ordered batches
    pub fn plan(&self, entries: &[SubtitleEntry]) -> Vec<Batch> {
        let mut batches: Vec<Batch> = Vec::new();
        let mut current: Vec<SubtitleEntry> = Vec::with_capacity(self.batch_size);
        let mut current_chars = 0;

        for entry in entries {
            let entry_chars = entry.char_count();

            if closes_batch(current.len(), current_chars, entry_chars, self.batch_size, self.max_chars) {
                let ordinal = batches.len();
                batches.push(Batch { ordinal, entries: std::mem::take(&mut current) });
                current_chars = 0;
            }

            current.push(entry.clone());
            current_chars += entry_chars;
        }

        if !current.is_empty() {
            let ordinal = batches.len();
            batches.push(Batch { ordinal, entries: current });
        }

        let planned: usize = batches.iter().map(|b| b.entries.len()).sum();
        if planned != entries.len() {
            error!("Lost entries during batching! Original: {}, planned: {}", entries.len(), planned);
        } else if log::max_level() >= log::LevelFilter::Debug {
            for batch in &batches {
                debug!("Batch {}: {} entries ({} chars)", batch.ordinal, batch.entries.len(), batch.char_count());
            }
        }

        batches
    }
}

/// Whether a batch holding `len` cues and `chars` characters must be closed
/// before a cue of `entry_chars` characters is added
fn closes_batch(len: usize, chars: usize, entry_chars: usize, batch_size: usize, max_chars: Option<usize>) -> bool {
    len > 0 && (len >= batch_size || max_chars.is_some_and(|max| chars + entry_chars > max))
}

/// Split cues into batches of at most `batch_size` cues
pub fn plan(entries: &[SubtitleEntry], batch_size: i64) -> Result<Vec<Batch>, ConfigError> {
    Ok(BatchPlanner::new(batch_size)?.plan(entries))
}

/// Number of batches `plan` would produce, without cloning any cue
pub fn batch_count(entry_count: usize, batch_size: usize) -> usize {
    entry_count.div_ceil(batch_size.max(1))
}

/// Number of batches a planner with a character budget would produce.
///
/// A `batch_size` of 0 counts as 1.
pub fn batch_count_with_budget(entries: &[SubtitleEntry], batch_size: usize, max_chars: Option<usize>) -> usize {
    let batch_size = batch_size.max(1);
    let max_chars = max_chars.filter(|&c| c > 0);
    if max_chars.is_none() {
        return batch_count(entries.len(), batch_size);
    }

    let mut count = 0;
    let (mut len, mut chars) = (0, 0);
    for entry in entries {
        let entry_chars = entry.char_count();
        if closes_batch(len, chars, entry_chars, batch_size, max_chars) {
            count += 1;
            len = 0;
            chars = 0;
        }
        len += 1;
        chars += entry_chars;
    }
    if len > 0 {
        count += 1;
    }
    count
}
