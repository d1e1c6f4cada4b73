// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use opensubtrans::app_config::{self, Config, TranslationProvider};
use opensubtrans::app_controller::{Controller, FileOutcome, RunOptions};
use opensubtrans::file_utils::FileManager;
use opensubtrans::language_utils;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate subtitle files (default command)
    Translate(TranslateArgs),

    /// Print the estimated cost of translating subtitle files
    Estimate(TranslateArgs),

    /// Generate shell completions for opensubtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language (code or name, 'auto' to detect)
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language (e.g. 'fr', 'zh-TW', 'Chinese (Traditional)')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Number of subtitles per request
    #[arg(short, long, allow_negative_numbers = true)]
    batch_size: Option<i64>,

    /// API key for the selected provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Terms file whose translations are always used
    #[arg(short, long, value_name = "TERMS_JSON")]
    glossary: Option<PathBuf>,

    /// Continue an interrupted translation from its partial output
    #[arg(long)]
    resume: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// opensubtrans - subtitle translation with language models
///
/// Translates SRT subtitle files batch by batch, carrying the translations of
/// names and recurring terms from one batch to the next.
#[derive(Parser, Debug)]
#[command(name = "opensubtrans")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(about = "Translate SRT subtitles with language models")]
#[command(long_about = "opensubtrans translates SRT subtitle files with OpenAI, Anthropic, Ollama or LM Studio,
keeping the translation of names and recurring terms consistent across the file.

EXAMPLES:
    opensubtrans movie.en.srt                          # Translate using default config
    opensubtrans -t fr movie.en.srt                    # Translate to French
    opensubtrans -p ollama -m llama3.2:3b movie.srt    # Use specific provider and model
    opensubtrans -g names.terms.json movie.srt         # Always use the given term translations
    opensubtrans --resume movie.srt                    # Continue an interrupted run
    opensubtrans estimate -b 20 movie.srt              # Print the estimated cost
    opensubtrans --log-level debug /subtitles/         # Process entire directory with debug logging
    opensubtrans completions bash > opensubtrans.bash  # Generate bash completions

OUTPUT:
    movie.<lang>.srt          translated subtitles
    movie.<lang>.terms.json   established term translations
    movie.<lang>.partial.srt  cues translated before an interruption

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The level is lowered or raised once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "opensubtrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        Some(Commands::Estimate(args)) => run_estimate(args),
        None => run_translate(cli.translate).await,
    }
}

/// Load the config file and apply the command line overrides
fn load_config(options: &TranslateArgs) -> Result<Config> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(api_key) = options.api_key.as_ref().filter(|k| !k.is_empty()) {
        let provider_config = config.translation.active_provider_config_mut();
        if provider_config.api_key.is_empty() {
            provider_config.api_key = api_key.clone();
        }
    }
    if let Some(batch_size) = options.batch_size {
        config.translation.common.batch_size = batch_size;
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

fn input_path(options: &TranslateArgs) -> Result<&Path> {
    options
        .input_path
        .as_deref()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let input_path = input_path(&options)?;
    let config = load_config(&options)?;

    let controller = Controller::with_config(config)?;
    controller.cancel_on_ctrl_c();

    let run_options = RunOptions {
        force_overwrite: options.force_overwrite,
        glossary: options.glossary.clone(),
        resume: options.resume,
    };

    if input_path.is_file() {
        let output_dir = input_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        match controller.run_with_options(input_path.to_path_buf(), output_dir, &run_options).await? {
            FileOutcome::Cancelled(partial) => {
                return Err(anyhow!("Translation cancelled, partial output saved to {:?}", partial));
            }
            FileOutcome::Translated(_) | FileOutcome::Skipped(_) => {}
        }
    } else if input_path.is_dir() {
        controller.run_folder(input_path.to_path_buf(), &run_options).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

fn run_estimate(options: TranslateArgs) -> Result<()> {
    let input_path = input_path(&options)?;
    let config = load_config(&options)?;

    let files = if input_path.is_dir() {
        let target = language_utils::resolve_language(&config.target_language)?;
        FileManager::find_source_subtitles(input_path, &target.code)?
    } else if input_path.is_file() {
        vec![input_path.to_path_buf()]
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    };

    let controller = Controller::with_config(config)?;
    let mut total_cost = 0.0;
    for file in &files {
        match controller.estimate(file) {
            Ok(estimate) => {
                println!("{}\n{}\n", file.display(), estimate);
                total_cost += estimate.total_cost;
            }
            Err(e) => warn!("Cannot estimate {:?}: {:#}", file, e),
        }
    }

    if files.len() > 1 {
        info!("Estimated total for {} files: ${:.6}", files.len(), total_cost);
    }
    Ok(())
}
