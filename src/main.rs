// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use yashwai::app_config::{self, Config, OracleProvider};
use yashwai::Controller;

/// CLI Wrapper for OracleProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOracleProvider {
    Ollama,
    Anthropic,
    Extractive,
}

impl From<CliOracleProvider> for OracleProvider {
    fn from(cli_provider: CliOracleProvider) -> Self {
        match cli_provider {
            CliOracleProvider::Ollama => OracleProvider::Ollama,
            CliOracleProvider::Anthropic => OracleProvider::Anthropic,
            CliOracleProvider::Extractive => OracleProvider::Extractive,
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
    /// Generate shell completions for yashwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// YashwAI - Your Audience-Specific Highlights With AI
///
/// Cuts a long video down to a highlight of a target duration, picking the
/// subtitle lines that matter to an audience with a language model.
#[derive(Parser, Debug)]
#[command(name = "yashwai")]
#[command(version = "0.1.0")]
#[command(about = "AI-picked video highlights of a target duration")]
#[command(long_about = "YashwAI reads a video's subtitles, asks a language model which lines best summarize it \
for an audience, and renders those moments into one clip of roughly the requested length.

EXAMPLES:
    yashwai talk.mp4                                 # 120s highlight using conf.json
    yashwai -d 60 talk.mp4                           # One-minute highlight
    yashwai -k teens -k gaming talk.mp4              # Keep only lines relevant to the audience
    yashwai -s subs/talk.en.srt -m bed.mp3 talk.mp4  # Explicit subtitles and background music
    yashwai -p anthropic --model claude-3-haiku-20240307 talk.mp4
    yashwai -p extractive talk.mp4                   # Offline summarizer, no model server
    yashwai completions bash > yashwai.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Command line options override the file.

OUTPUT:
    The highlight is written next to the video as <name>_summary.<container>.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Source video to summarize
    #[arg(value_name = "VIDEO")]
    source_video: Option<PathBuf>,

    /// Subtitle file (defaults to the video path with an .srt extension)
    #[arg(short, long)]
    subtitles: Option<PathBuf>,

    /// Target highlight duration in seconds
    #[arg(short = 'd', long)]
    duration: Option<f64>,

    /// Audience keyword; repeat for several
    #[arg(short = 'k', long = "keyword")]
    keywords: Vec<String>,

    /// Background music track
    #[arg(short, long)]
    music: Option<PathBuf>,

    /// Oracle provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliOracleProvider>,

    /// Model name to use
    #[arg(long)]
    model: Option<String>,

    /// Oracle endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Oracle API key
    #[arg(long, env = "YASHWAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                color, now, record.level(), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is set once options are known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "yashwai", &mut std::io::stdout());
        return Ok(());
    }

    run_summary(cli).await
}

/// Apply command line options on top of the file configuration
fn apply_overrides(config: &mut Config, options: &CommandLineOptions) {
    if let Some(video) = &options.source_video {
        config.source_video = video.clone();
    }
    if let Some(subtitles) = &options.subtitles {
        config.subtitle_source = Some(subtitles.clone());
    }
    if let Some(duration) = options.duration {
        config.target_duration_secs = duration;
    }
    if !options.keywords.is_empty() {
        config.demographic_keywords = options.keywords.clone();
    }
    if let Some(music) = &options.music {
        config.music_track = Some(music.clone());
    }
    if let Some(provider) = &options.provider {
        let provider: OracleProvider = provider.clone().into();
        if provider != config.oracle.provider {
            // Endpoint and model of another provider do not carry over
            config.oracle.endpoint = String::new();
            config.oracle.model = String::new();
        }
        config.oracle.provider = provider;
    }
    if let Some(model) = &options.model {
        config.oracle.model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.oracle.endpoint = endpoint.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.oracle.api_key = api_key.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_summary(options: CommandLineOptions) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);

    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    let output = controller.run(options.force).await?;

    info!("Success: {}", output.display());
    Ok(())
}
