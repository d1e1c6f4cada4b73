/*!
 * Proper-noun detection for prompt hints.
 *
 * Finds capitalized words and phrases that are likely names or places so the
 * prompt can point the model at terms it should report back. This is a
 * heuristic: it never writes to the context memory on its own.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

static CAPITALIZED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]*)*\b").expect("capitalized pattern is valid")
});

static SIMPLE_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Z][a-z]+|[A-Z][a-z]+\s+[A-Z][a-z]+|(?:Dr|Mr|Mrs|Ms)\.?\s.*)$")
        .expect("name pattern is valid")
});

const COMMON_WORDS: &[&str] = &[
    "I", "The", "A", "An", "This", "That", "These", "Those", "It", "He", "She", "They", "We",
    "You", "My", "Your", "His", "Her", "Our", "Their", "What", "Who", "Where", "When", "Why",
    "How", "Yes", "No", "Ok", "OK", "Okay", "Oh", "Ah", "Hey", "Well", "So", "But", "And", "Or",
    "If", "Then", "Now", "Here", "There", "Come", "Go", "Get", "Take", "Give", "Make", "Let",
    "See", "Look", "Good", "Bad", "Please", "Thank", "Thanks", "Sorry", "Hello", "Hi", "Just",
    "Really", "Maybe", "Wait", "Stop", "Don", "Is", "Are", "Do", "Did", "Can", "Will", "Not",
];

/// Configuration for term extraction.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Terms seen at least this often are always kept
    pub min_occurrences: usize,

    /// Maximum number of terms to return
    pub max_terms: usize,

    /// Words never treated as terms
    pub exclude_words: HashSet<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 2,
            max_terms: 20,
            exclude_words: COMMON_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Heuristic detector of likely proper nouns.
#[derive(Debug, Clone, Default)]
pub struct TermExtractor {
    config: ExtractionConfig,
}

impl TermExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Likely proper nouns in `texts`, sorted alphabetically.
    ///
    /// A capitalized phrase is kept when it recurs at least
    /// `min_occurrences` times or looks like a name on its own.
    pub fn extract<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for text in texts {
            for m in CAPITALIZED_PATTERN.find_iter(text.as_ref()) {
                let candidate = self.strip_leading_common(m.as_str());
                if candidate.chars().count() >= 2 && !self.config.exclude_words.contains(&candidate) {
                    *counts.entry(candidate).or_insert(0) += 1;
                }
            }
        }

        counts
            .into_iter()
            .filter(|(term, count)| *count >= self.config.min_occurrences || Self::is_likely_proper_noun(term))
            .map(|(term, _)| term)
            .take(self.config.max_terms)
            .collect()
    }

    /// Drop sentence starters glued to a name ("Hey John" -> "John")
    fn strip_leading_common(&self, phrase: &str) -> String {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        let first_kept = words
            .iter()
            .position(|w| !self.config.exclude_words.contains(*w))
            .unwrap_or(words.len());
        words[first_kept..].join(" ")
    }

    fn is_likely_proper_noun(term: &str) -> bool {
        if SIMPLE_NAME_PATTERN.is_match(term) {
            return true;
        }

        let capitals = term.chars().filter(|c| c.is_uppercase()).count();
        capitals >= 2 && term.chars().count() >= 4
    }
}
