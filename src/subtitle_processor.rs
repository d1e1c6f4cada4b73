use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use log::{debug, warn};

use crate::errors::SubtitleError;

// @module: SRT parsing and serialization

// @const: SRT timestamp line, tolerating '.' millis and trailing position data
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})(?:\s.*)?$")
        .expect("timestamp regex is valid")
});

// @const: Loose timestamp detector used by content sniffing
static TIMESTAMP_SNIFF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{2}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{2}:\d{2}:\d{2}[,.]\d{3}")
        .expect("timestamp sniff regex is valid")
});

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Cue index as written in the file (1-based)
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Text lines, in display order
    pub lines: Vec<String>,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry from a block of text
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: &str) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            lines: text.lines().map(|l| l.to_string()).collect(),
        }
    }

    /// Text lines joined with newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Number of characters across all text lines
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum()
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow::anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow::anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Parse SRT content into cues.
///
/// Blocks are separated by blank lines. Each block must start with a numeric
/// index, followed by a timestamp line and at least one text line. Indices must
/// be strictly increasing. CRLF endings, a leading BOM and surrounding blank
/// lines are accepted.
pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut entries: Vec<SubtitleEntry> = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if !block.is_empty() {
                entries.push(parse_block(&block, entries.last())?);
                block.clear();
            }
            continue;
        }
        block.push((line_idx + 1, line));
    }

    if !block.is_empty() {
        entries.push(parse_block(&block, entries.last())?);
    }

    debug!("Parsed {} subtitle entries", entries.len());
    Ok(entries)
}

/// Parse one blank-line-delimited block
fn parse_block(block: &[(usize, &str)], previous: Option<&SubtitleEntry>) -> Result<SubtitleEntry, SubtitleError> {
    let (index_line_no, index_line) = block[0];
    let seq_num: usize = index_line.trim().parse().map_err(|_| SubtitleError::MissingIndex {
        line: index_line_no,
        found: index_line.trim().to_string(),
    })?;

    if let Some(prev) = previous {
        if seq_num <= prev.seq_num {
            return Err(SubtitleError::IndexNotIncreasing {
                line: index_line_no,
                previous: prev.seq_num,
                found: seq_num,
            });
        }
    }

    let (ts_line_no, ts_line) = match block.get(1) {
        Some(&(no, line)) => (no, line),
        None => {
            return Err(SubtitleError::MalformedTimestamp {
                line: index_line_no + 1,
                found: String::new(),
            });
        }
    };

    let (start_time_ms, end_time_ms) = parse_timestamp_line(ts_line).ok_or_else(|| {
        SubtitleError::MalformedTimestamp {
            line: ts_line_no,
            found: ts_line.trim().to_string(),
        }
    })?;

    if end_time_ms <= start_time_ms {
        return Err(SubtitleError::InvalidTimeRange { index: seq_num });
    }

    let lines: Vec<String> = block[2..]
        .iter()
        .map(|(_, l)| l.trim_end().to_string())
        .collect();

    if lines.is_empty() {
        return Err(SubtitleError::MissingText { index: seq_num });
    }

    Ok(SubtitleEntry {
        seq_num,
        start_time_ms,
        end_time_ms,
        lines,
    })
}

/// Parse a `start --> end` line into milliseconds
fn parse_timestamp_line(line: &str) -> Option<(u64, u64)> {
    let caps = TIMESTAMP_REGEX.captures(line.trim())?;
    Some((timestamp_from_captures(&caps, 1)?, timestamp_from_captures(&caps, 5)?))
}

fn timestamp_from_captures(caps: &regex::Captures, start_idx: usize) -> Option<u64> {
    let field = |i: usize| caps.get(start_idx + i).and_then(|m| m.as_str().parse::<u64>().ok());
    let (hours, minutes, seconds, millis) = (field(0)?, field(1)?, field(2)?, field(3)?);

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    Some((hours * 3600 + minutes * 60 + seconds) * 1000 + millis)
}

/// Render cues as canonical SRT text
pub fn to_srt_string(entries: &[SubtitleEntry]) -> String {
    entries.iter().map(|e| e.to_string()).collect()
}

/// Quick check that content looks like SRT and yields at least one cue
pub fn validate_srt_content(content: &str) -> bool {
    if !TIMESTAMP_SNIFF_REGEX.is_match(content) {
        return false;
    }

    match parse_srt_string(content) {
        Ok(entries) => !entries.is_empty(),
        Err(e) => {
            debug!("Content failed SRT validation: {}", e);
            false
        }
    }
}

/// Collection of subtitle entries with metadata
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Create an empty collection
    pub fn new(source_file: PathBuf) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
        }
    }

    /// Read and parse an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        let entries = parse_srt_string(&content)
            .with_context(|| format!("Invalid SRT content in {}", path.display()))?;

        if entries.is_empty() {
            warn!("No subtitle entries found in {}", path.display());
        }

        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries,
        })
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        fs::write(path, to_srt_string(&self.entries))
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;

        Ok(())
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
