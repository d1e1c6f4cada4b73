/*!
 * Parsing of tagged batch responses.
 *
 * Expected shape:
 *
 * ```text
 * <<ENTRY_12>>
 * translated text
 * <<ENTRY_13>>
 * translated text
 * <<TERMS>>
 * Mary => 瑪麗 | name
 * <<END>>
 * ```
 *
 * Anything before the first tag or after `<<END>>` is ignored. The term
 * section is optional.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

use crate::errors::ResponseFormatError;
use crate::translation::context::{TermCategory, TermEntry};
use crate::translation::prompts::{END_MARKER, TERMS_MARKER};

static ENTRY_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<<\s*ENTRY_(\d+)\s*>>(.*)$").expect("entry tag pattern is valid")
});

static TERM_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*•]\s*)?(.+?)\s*(?:=>|→|->)\s*([^|]+?)\s*(?:\|\s*(.*?))?\s*$")
        .expect("term line pattern is valid")
});

/// Content of a structurally valid response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResponse {
    /// Translated lines keyed by cue index
    pub entries: BTreeMap<usize, Vec<String>>,

    /// Term translations reported by the model
    pub terms: Vec<TermEntry>,
}

impl BatchResponse {
    pub fn lines_for(&self, seq_num: usize) -> Option<&[String]> {
        self.entries.get(&seq_num).map(|l| l.as_slice())
    }
}

enum Section {
    Preamble,
    Entry(usize),
    Terms,
}

/// Parse a response and check it answers exactly the `expected` cue indices
pub fn parse_batch_response(text: &str, expected: &[usize]) -> Result<BatchResponse, ResponseFormatError> {
    if text.trim().is_empty() {
        return Err(ResponseFormatError::Empty);
    }

    let lines: Vec<&str> = text.lines().collect();
    let end = lines
        .iter()
        .position(|l| l.trim() == END_MARKER)
        .ok_or(ResponseFormatError::MissingEndMarker)?;

    let expected_set: HashSet<usize> = expected.iter().copied().collect();
    let mut response = BatchResponse::default();
    let mut section = Section::Preamble;

    for raw in &lines[..end] {
        let line = raw.trim_end();
        let trimmed = line.trim();

        if let Some(caps) = ENTRY_TAG_REGEX.captures(trimmed) {
            let seq_num = caps[1]
                .parse::<usize>()
                .map_err(|_| ResponseFormatError::InvalidEntryTag(caps[0].to_string()))?;
            if !expected_set.contains(&seq_num) {
                return Err(ResponseFormatError::UnexpectedEntry(seq_num));
            }
            if response.entries.contains_key(&seq_num) {
                return Err(ResponseFormatError::DuplicateEntry(seq_num));
            }

            let inline = caps[2].trim();
            let first = if inline.is_empty() { Vec::new() } else { vec![inline.to_string()] };
            response.entries.insert(seq_num, first);
            section = Section::Entry(seq_num);
            continue;
        }

        if trimmed == TERMS_MARKER {
            section = Section::Terms;
            continue;
        }

        match section {
            Section::Preamble => {
                if !trimmed.is_empty() {
                    debug!("Ignoring text before first entry tag: {}", trimmed);
                }
            }
            Section::Entry(seq_num) => {
                // A blank line would end the SRT block early
                if trimmed.is_empty() {
                    continue;
                }
                if let Some(entry_lines) = response.entries.get_mut(&seq_num) {
                    entry_lines.push(line.to_string());
                }
            }
            Section::Terms => {
                if trimmed.is_empty() {
                    continue;
                }
                match parse_term_line(trimmed) {
                    Some(term) => response.terms.push(term),
                    None => warn!("Skipping malformed term line: {}", trimmed),
                }
            }
        }
    }

    if let Some((seq_num, _)) = response.entries.iter().find(|(_, l)| l.is_empty()) {
        return Err(ResponseFormatError::EmptyEntry(*seq_num));
    }

    if let Some(missing) = expected.iter().find(|s| !response.entries.contains_key(s)) {
        return Err(ResponseFormatError::MissingEntry(*missing));
    }

    Ok(response)
}

/// Parse one `source => target | category` line
pub fn parse_term_line(line: &str) -> Option<TermEntry> {
    let caps = TERM_LINE_REGEX.captures(line)?;
    let source = caps.get(1)?.as_str().trim();
    let target = caps.get(2)?.as_str().trim();
    if source.is_empty() || target.is_empty() {
        return None;
    }

    let category = caps
        .get(3)
        .map(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .map_or(TermCategory::OtherProperNoun, |c| {
            c.parse().unwrap_or_else(|_| {
                debug!("Unknown term category '{}', using other_proper_noun", c);
                TermCategory::OtherProperNoun
            })
        });

    Some(TermEntry::new(source, target, category))
}
