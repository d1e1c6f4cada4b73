/*!
 * Context memory for terminology consistency.
 *
 * Maps normalized source terms to the translation chosen for them the first
 * time they were seen. During a run the memory only grows: a later batch can
 * never replace an established translation. Explicit user overrides go
 * through [`ContextMemory::pin`].
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of term tracked in the memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCategory {
    /// Person or character name
    Name,
    /// Geographic or fictional location
    Place,
    /// Any other proper noun or recurring term
    OtherProperNoun,
}

impl TermCategory {
    /// Lowercase label used in prompts and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Place => "place",
            Self::OtherProperNoun => "other_proper_noun",
        }
    }
}

impl fmt::Display for TermCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TermCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "name" | "person" | "character" => Ok(Self::Name),
            "place" | "location" => Ok(Self::Place),
            "other" | "other_proper_noun" | "proper_noun" | "term" => Ok(Self::OtherProperNoun),
            other => Err(format!("unknown term category: {}", other)),
        }
    }
}

/// One source-term-to-target-term mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub source_term: String,
    pub target_term: String,
    pub category: TermCategory,
}

impl TermEntry {
    pub fn new(source_term: &str, target_term: &str, category: TermCategory) -> Self {
        Self {
            source_term: source_term.trim().to_string(),
            target_term: target_term.trim().to_string(),
            category,
        }
    }
}

/// Normalize a term for lookup: trimmed, inner whitespace collapsed, lowercase
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Snapshot of the memory for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    pub total_terms: usize,
    pub high_confidence_terms: usize,
    pub batches_recorded: usize,
}

/// A translation that ignores an established term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyIssue {
    pub source_term: String,
    pub expected: String,
}

impl ConsistencyIssue {
    /// Get a human-readable description of the issue.
    pub fn description(&self) -> String {
        format!(
            "Term '{}' should be translated as '{}' for consistency",
            self.source_term, self.expected
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTerm {
    #[serde(flatten)]
    entry: TermEntry,
    #[serde(default = "default_confidence")]
    confidence: u32,
}

fn default_confidence() -> u32 {
    1
}

/// Append-only store of established term translations
#[derive(Debug, Clone, Default)]
pub struct ContextMemory {
    /// Terms in first-insertion order
    terms: Vec<StoredTerm>,

    /// Normalized source term -> position in `terms`
    index: HashMap<String, usize>,

    /// Number of non-empty upserts applied
    batches_recorded: usize,
}

impl ContextMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Look up an established term by its (normalized) source form
    pub fn lookup(&self, source_term: &str) -> Option<&TermEntry> {
        self.index
            .get(&normalize_term(source_term))
            .map(|&pos| &self.terms[pos].entry)
    }

    /// All established entries in first-insertion order
    pub fn entries(&self) -> impl Iterator<Item = &TermEntry> {
        self.terms.iter().map(|t| &t.entry)
    }

    /// Merge candidate terms, first seen wins.
    ///
    /// Absent terms are inserted; a term that already exists keeps its target
    /// and only has its confidence raised. Returns the newly inserted entries.
    pub fn upsert<I>(&mut self, candidates: I) -> Vec<TermEntry>
    where
        I: IntoIterator<Item = TermEntry>,
    {
        let mut inserted = Vec::new();
        let mut seen_any = false;

        for candidate in candidates {
            let key = normalize_term(&candidate.source_term);
            if key.is_empty() || candidate.target_term.trim().is_empty() {
                debug!("Ignoring incomplete term candidate: {:?}", candidate);
                continue;
            }
            seen_any = true;

            match self.index.get(&key) {
                Some(&pos) => {
                    let stored = &mut self.terms[pos];
                    stored.confidence += 1;
                    if stored.entry.target_term != candidate.target_term.trim() {
                        debug!(
                            "Keeping '{}' → '{}', ignoring proposed '{}'",
                            stored.entry.source_term, stored.entry.target_term, candidate.target_term
                        );
                    }
                }
                None => {
                    let entry = TermEntry::new(&candidate.source_term, &candidate.target_term, candidate.category);
                    self.index.insert(key, self.terms.len());
                    self.terms.push(StoredTerm { entry: entry.clone(), confidence: 1 });
                    inserted.push(entry);
                }
            }
        }

        if seen_any {
            self.batches_recorded += 1;
        }

        inserted
    }

    /// Explicitly set a term's translation, replacing any established one.
    ///
    /// The term keeps its original position when it already exists.
    pub fn pin(&mut self, entry: TermEntry) {
        let key = normalize_term(&entry.source_term);
        if key.is_empty() || entry.target_term.trim().is_empty() {
            return;
        }

        let entry = TermEntry::new(&entry.source_term, &entry.target_term, entry.category);
        match self.index.get(&key) {
            Some(&pos) => self.terms[pos].entry = entry,
            None => {
                self.index.insert(key, self.terms.len());
                self.terms.push(StoredTerm { entry, confidence: 1 });
            }
        }
    }

    /// How many times a term has been proposed
    pub fn confidence(&self, source_term: &str) -> u32 {
        self.index
            .get(&normalize_term(source_term))
            .map_or(0, |&pos| self.terms[pos].confidence)
    }

    /// Entries proposed at least `min_confidence` times
    pub fn established_terms(&self, min_confidence: u32) -> Vec<&TermEntry> {
        self.terms
            .iter()
            .filter(|t| t.confidence >= min_confidence)
            .map(|t| &t.entry)
            .collect()
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            total_terms: self.terms.len(),
            high_confidence_terms: self.established_terms(2).len(),
            batches_recorded: self.batches_recorded,
        }
    }

    /// Render the memory for injection into a prompt.
    ///
    /// One line per entry in insertion order; empty when nothing is
    /// established yet.
    pub fn render_for_prompt(&self) -> String {
        self.terms
            .iter()
            .map(|t| format!("- {} → {} ({})", t.entry.source_term, t.entry.target_term, t.entry.category))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Established terms present in `original` whose target is missing from `translated`
    pub fn check_consistency(&self, original: &str, translated: &str) -> Vec<ConsistencyIssue> {
        let original_lower = original.to_lowercase();
        let translated_lower = translated.to_lowercase();

        self.terms
            .iter()
            .filter(|t| original_lower.contains(&normalize_term(&t.entry.source_term)))
            .filter(|t| !translated_lower.contains(&t.entry.target_term.to_lowercase()))
            .map(|t| ConsistencyIssue {
                source_term: t.entry.source_term.clone(),
                expected: t.entry.target_term.clone(),
            })
            .collect()
    }

    /// Export the memory as a JSON array, in insertion order
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.terms)
    }

    /// Load a memory previously written by [`ContextMemory::to_json`] or a
    /// hand-written list of `{source_term, target_term, category}` objects
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let stored: Vec<StoredTerm> = serde_json::from_str(json)?;
        let mut memory = Self::new();
        for term in stored {
            let key = normalize_term(&term.entry.source_term);
            if key.is_empty() || term.entry.target_term.trim().is_empty() || memory.index.contains_key(&key) {
                debug!("Ignoring stored term: {:?}", term.entry);
                continue;
            }
            let entry = TermEntry::new(&term.entry.source_term, &term.entry.target_term, term.entry.category);
            memory.index.insert(key, memory.terms.len());
            memory.terms.push(StoredTerm { entry, confidence: term.confidence });
        }
        Ok(memory)
    }
}
