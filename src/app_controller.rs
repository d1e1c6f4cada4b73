use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::{ConfigError, ProviderError, TranslationError};
use crate::file_utils::{FileManager, FileType, OutputPaths};
use crate::language_utils::{self, ResolvedLanguage};
use crate::providers::Provider;
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};
use crate::translation::batch::{Batch, BatchPlanner};
use crate::translation::context::ContextMemory;
use crate::translation::cost::{CostEstimate, CostEstimator};
use crate::translation::orchestrator::{BatchEvent, CancellationToken, ProgressSink, RunStatus};
use crate::translation::TranslationService;

// @module: Application controller for subtitle processing

/// Per-file switches of a translation run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Translate even when the output file already exists
    pub force_overwrite: bool,

    /// Terms file whose entries are pinned into the context memory
    pub glossary: Option<PathBuf>,

    /// Continue from a previous partial output
    pub resume: bool,
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Every cue was translated and written to the path
    Translated(PathBuf),
    /// The output already existed
    Skipped(PathBuf),
    /// Interrupted; the cues done so far are in the partial file
    Cancelled(PathBuf),
}

/// Progress bar sink for one file
struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    fn new(multi_progress: &MultiProgress) -> Self {
        let bar = multi_progress.add(ProgressBar::new(0));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(template_result.progress_chars("#>-"));
        Self { bar }
    }
}

impl ProgressSink for ProgressBarSink {
    fn run_started(&self, total_batches: usize, _total_cues: usize) {
        self.bar.set_length(total_batches as u64);
        self.bar.set_message("Translating");
    }

    fn batch_completed(&self, event: &BatchEvent) {
        self.bar.set_position(event.ordinal as u64 + 1);
        if !event.new_terms.is_empty() {
            self.bar.set_message(format!("+{} terms", event.new_terms.len()));
        }
    }

    fn batch_retrying(&self, ordinal: usize, attempt: u32, _error: &ProviderError) {
        self.bar.set_message(format!("Retrying batch {} (attempt {})", ordinal + 1, attempt + 1));
    }
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Provider used instead of the configured one
    provider: Option<Arc<dyn Provider>>,

    // @field: Shared by every run of this controller
    cancel: CancellationToken,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            provider: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Translate through `provider` instead of building one from the config
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token cancelling the current and following runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel on the first Ctrl-C; the batch in flight still completes
    pub fn cancel_on_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing the current batch before stopping");
                cancel.cancel();
            }
        });
    }

    fn translation_service(&self) -> Result<TranslationService> {
        Ok(match &self.provider {
            Some(provider) => TranslationService::with_provider(Arc::clone(provider), self.config.translation.clone()),
            None => TranslationService::new(self.config.translation.clone())?,
        })
    }

    fn languages(&self) -> Result<(Option<ResolvedLanguage>, ResolvedLanguage)> {
        let source = language_utils::resolve_source_language(&self.config.source_language)?;
        let target = language_utils::resolve_language(&self.config.target_language)?;
        Ok((source, target))
    }

    /// Estimate the cost of translating one file with the configured model
    pub fn estimate(&self, input_file: &Path) -> Result<CostEstimate> {
        let subtitles = SubtitleCollection::from_srt_file(input_file)?;
        let (_, target) = self.languages()?;

        let batch_size = self.config.translation.common.batch_size;
        if batch_size <= 0 {
            return Err(ConfigError::InvalidBatchSize(batch_size).into());
        }

        let estimate = CostEstimator::new(&target.name)
            .with_max_chars(self.config.translation.common.max_chars_per_batch)
            .estimate_with_table(
                &subtitles.entries,
                &self.config.pricing_table(),
                &self.config.translation.get_model(),
                batch_size as usize,
            )?;
        Ok(estimate)
    }

    /// Run the main workflow with input subtitle file and output directory
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<FileOutcome> {
        let options = RunOptions {
            force_overwrite,
            ..Default::default()
        };
        self.run_with_options(input_file, output_dir, &options).await
    }

    /// Run one file with explicit options
    pub async fn run_with_options(&self, input_file: PathBuf, output_dir: PathBuf, options: &RunOptions) -> Result<FileOutcome> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, options).await
    }

    /// Run the controller with progress reporting
    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        options: &RunOptions,
    ) -> Result<FileOutcome> {
        let start_time = Instant::now();

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        if FileManager::detect_file_type(input_file)? != FileType::Subtitle {
            return Err(anyhow!("Not an SRT subtitle file: {:?}", input_file));
        }

        self.config.validate().context("Configuration validation failed")?;
        let (source, target) = self.languages()?;

        FileManager::ensure_dir(output_dir)?;
        let paths = FileManager::output_paths(input_file, output_dir, &target.code);
        if paths.translated.exists() && !options.force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(FileOutcome::Skipped(paths.translated));
        }

        let subtitles = SubtitleCollection::from_srt_file(input_file)?;
        let common = &self.config.translation.common;
        let batches = BatchPlanner::new(common.batch_size)?
            .with_max_chars(common.max_chars_per_batch)
            .plan(&subtitles.entries);

        let (mut done, mut memory) = if options.resume {
            self.load_previous_run(&paths, &subtitles.entries, &batches)?
        } else {
            if FileManager::file_exists(&paths.partial) {
                info!("Ignoring partial output {:?} (use --resume to continue it)", paths.partial);
            }
            (Vec::new(), ContextMemory::new())
        };
        let first_batch = first_pending_batch(&batches, &done);
        done.truncate(batches.iter().take(first_batch).map(|b| b.entries.len()).sum());

        if let Some(glossary) = &options.glossary {
            let pinned = load_terms(glossary).with_context(|| format!("Failed to load glossary: {:?}", glossary))?;
            info!("Pinned {} glossary term(s) from {:?}", pinned.len(), glossary);
            for entry in pinned.entries() {
                memory.pin(entry.clone());
            }
        }

        let service = self.translation_service()?;
        let model = service.config.get_model();
        match CostEstimator::new(&target.name)
            .with_max_chars(common.max_chars_per_batch)
            .estimate_with_table(
                &subtitles.entries,
                &self.config.pricing_table(),
                &model,
                common.batch_size as usize,
            ) {
            Ok(estimate) => info!("Estimated cost: ${:.4} for {} batches", estimate.total_cost, estimate.batch_count),
            Err(e) => warn!("No cost estimate: {}", e),
        }

        info!(
            "{} - {}: {} -> {}",
            self.config.translation.provider.display_name(),
            model,
            source.as_ref().map_or("auto", |s| s.name.as_str()),
            target.name
        );

        let source_name = source.map(|s| s.name).unwrap_or_default();
        let mut orchestrator = service.orchestrator(&source_name, &target.name).with_memory(memory);
        let sink = ProgressBarSink::new(multi_progress);

        let result = orchestrator
            .run_from(&subtitles.entries, common.batch_size, first_batch, &self.cancel, &sink)
            .await;
        sink.bar.finish_and_clear();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(TranslationError::RunAborted(aborted)) => {
                done.extend(aborted.translated.iter().cloned());
                self.save_partial(&paths, input_file, &done, &aborted.memory)?;
                return Err(anyhow::Error::new(TranslationError::RunAborted(aborted)))
                    .with_context(|| format!("Translation aborted, partial output in {:?}", paths.partial));
            }
            Err(e) => return Err(e.into()),
        };

        if outcome.usage.total_tokens > 0 {
            info!("{}", outcome.usage.summary());
        }
        done.extend(outcome.translated);

        match outcome.status {
            RunStatus::Completed => {
                let collection = SubtitleCollection {
                    source_file: input_file.to_path_buf(),
                    entries: done,
                };
                collection.write_to_srt(&paths.translated)?;
                save_terms(&paths.terms, &outcome.memory)?;
                FileManager::remove_if_exists(&paths.partial)?;

                info!(
                    "Success: {} ({} terms, {})",
                    paths.translated.display(),
                    outcome.memory.len(),
                    Self::format_duration(start_time.elapsed())
                );
                Ok(FileOutcome::Translated(paths.translated))
            }
            RunStatus::Cancelled { next_batch } => {
                self.save_partial(&paths, input_file, &done, &outcome.memory)?;
                warn!(
                    "Cancelled before batch {}/{}; rerun with --resume to continue",
                    next_batch + 1,
                    batches.len()
                );
                Ok(FileOutcome::Cancelled(paths.partial))
            }
        }
    }

    /// Translated cues and memory left by an earlier interrupted run
    fn load_previous_run(
        &self,
        paths: &OutputPaths,
        entries: &[SubtitleEntry],
        batches: &[Batch],
    ) -> Result<(Vec<SubtitleEntry>, ContextMemory)> {
        if !FileManager::file_exists(&paths.partial) {
            info!("Nothing to resume at {:?}, starting from the beginning", paths.partial);
            return Ok((Vec::new(), ContextMemory::new()));
        }

        let partial = SubtitleCollection::from_srt_file(&paths.partial)?;
        let memory = if FileManager::file_exists(&paths.terms) {
            load_terms(&paths.terms)?
        } else {
            ContextMemory::new()
        };

        let first_batch = first_pending_batch(batches, &partial.entries);
        info!(
            "Resuming at batch {}/{} ({} of {} cues done, {} terms)",
            first_batch + 1,
            batches.len(),
            partial.entries.len().min(entries.len()),
            entries.len(),
            memory.len()
        );
        Ok((partial.entries, memory))
    }

    fn save_partial(&self, paths: &OutputPaths, input_file: &Path, done: &[SubtitleEntry], memory: &ContextMemory) -> Result<()> {
        let collection = SubtitleCollection {
            source_file: input_file.to_path_buf(),
            entries: done.to_vec(),
        };
        collection.write_to_srt(&paths.partial)?;
        save_terms(&paths.terms, memory)?;
        info!("Saved {} translated cue(s) to {}", done.len(), paths.partial.display());
        Ok(())
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Run the workflow in folder mode, processing all subtitle files in a directory
    /// Files that already have translated subtitles will be skipped
    pub async fn run_folder(&self, input_dir: PathBuf, options: &RunOptions) -> Result<()> {
        let start_time = Instant::now();

        if !input_dir.exists() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let target = language_utils::resolve_language(&self.config.target_language)?;
        let subtitle_files = FileManager::find_source_subtitles(&input_dir, &target.code)?;
        if subtitle_files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(subtitle_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("#>-"));
        folder_pb.set_message("Processing files");

        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;

        for subtitle_file in subtitle_files.iter() {
            if self.cancel.is_cancelled() {
                warn!("Cancelled, {} file(s) left untouched", subtitle_files.len() - (success_count + error_count + skip_count));
                break;
            }

            let file_name = subtitle_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = match subtitle_file.parent() {
                Some(parent) => parent.to_path_buf(),
                None => input_dir.clone(),
            };

            match self.run_with_progress(subtitle_file, &output_dir, &multi_progress, options).await {
                Ok(FileOutcome::Translated(_)) => success_count += 1,
                Ok(FileOutcome::Skipped(_)) => skip_count += 1,
                Ok(FileOutcome::Cancelled(path)) => {
                    debug!("Partial output kept at {:?}", path);
                    error_count += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    error_count += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            success_count,
            skip_count,
            error_count,
            Self::format_duration(start_time.elapsed())
        );

        Ok(())
    }
}

/// Ordinal of the first batch not fully covered by `done`.
///
/// `done` must start with the batch cues, matching sequence number and start
/// time; the first mismatch ends the covered prefix.
fn first_pending_batch(batches: &[Batch], done: &[SubtitleEntry]) -> usize {
    let mut covered = 0;
    for batch in batches {
        let end = covered + batch.entries.len();
        if end > done.len() {
            return batch.ordinal;
        }
        let same = batch
            .entries
            .iter()
            .zip(&done[covered..end])
            .all(|(source, translated)| {
                source.seq_num == translated.seq_num && source.start_time_ms == translated.start_time_ms
            });
        if !same {
            return batch.ordinal;
        }
        covered = end;
    }
    batches.len()
}

fn load_terms(path: &Path) -> Result<ContextMemory> {
    let json = FileManager::read_to_string(path)?;
    ContextMemory::from_json(&json).with_context(|| format!("Invalid terms file: {:?}", path))
}

fn save_terms(path: &Path, memory: &ContextMemory) -> Result<()> {
    let json = memory.to_json().context("Failed to serialize context memory")?;
    FileManager::write_to_file(path, &json)
}
