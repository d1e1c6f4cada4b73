/*!
 * Common test utilities for the opensubtrans test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tempfile::TempDir;

use opensubtrans::app_config::{Config, TranslationProvider};
use opensubtrans::subtitle_processor::SubtitleEntry;
use opensubtrans::translation::OrchestratorOptions;

static INIT_LOGGER: Once = Once::new();

/// Route `log` output through env_logger once per test binary
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Three short cues, the second on two lines
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
Mary went home.

2
00:00:05,000 --> 00:00:09,000
Where is the station?
It is late.

3
00:00:10,000 --> 00:00:14,000
Mary is waiting.
";

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// An SRT document with `count` numbered cues
pub fn numbered_srt(count: usize) -> String {
    (1..=count)
        .map(|i| {
            let start = i as u64 * 2000;
            format!(
                "{}\n{} --> {}\nLine number {}\n\n",
                i,
                SubtitleEntry::format_timestamp(start),
                SubtitleEntry::format_timestamp(start + 1500),
                i
            )
        })
        .collect()
}

/// `count` cues with distinct timings and text
pub fn numbered_entries(count: usize) -> Vec<SubtitleEntry> {
    (1..=count)
        .map(|i| SubtitleEntry::new(i, i as u64 * 2000, i as u64 * 2000 + 1500, &format!("Line number {}", i)))
        .collect()
}

/// Orchestrator options with fast retries for tests
pub fn fast_options() -> OrchestratorOptions {
    OrchestratorOptions {
        model: "mock-model".to_string(),
        source_language: "English".to_string(),
        target_language: "Chinese (Traditional)".to_string(),
        backoff_base_ms: 1,
        call_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

/// A valid config for the OpenAI provider with quick retries
pub fn test_config(target_language: &str, batch_size: i64) -> Config {
    let mut config = Config {
        source_language: "en".to_string(),
        target_language: target_language.to_string(),
        ..Default::default()
    };
    config.translation.provider = TranslationProvider::OpenAI;
    config.translation.active_provider_config_mut().api_key = "test-key".to_string();
    config.translation.common.batch_size = batch_size;
    config.translation.common.retry_backoff_ms = 1;
    config.translation.common.retry_count = 1;
    config
}
