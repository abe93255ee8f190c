use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, OracleConfig, OracleProvider};
use crate::errors::SummaryError;
use crate::file_utils::{FileManager, FileType};
use crate::media::{AudioDucker, Ffmpeg, SegmentAssembler};
use crate::providers::Oracle;
use crate::providers::anthropic::AnthropicOracle;
use crate::providers::extractive::ExtractiveOracle;
use crate::providers::ollama::OllamaOracle;
use crate::providers::retry::RetryingOracle;
use crate::subtitle_processor::SubtitleDecoder;
use crate::summary::{ConvergedSummary, DurationConverger, IterationReport, RelevanceFilter};
use crate::timeline::Timeline;

// @module: Application controller for highlight generation

/// Main application controller: decode, select, assemble, duck
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Oracle shared by the relevance filter and the converger
    oracle: Arc<dyn Oracle>,
    // @field: Codec layer
    ffmpeg: Ffmpeg,
}

impl Controller {
    // @method: Create a new controller with the oracle described by the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let oracle = Self::build_oracle(&config.oracle)?;
        Ok(Self::with_oracle(config, oracle))
    }

    // @method: Create a new controller around an existing oracle
    pub fn with_oracle(config: Config, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            config,
            oracle,
            ffmpeg: Ffmpeg::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the configured backend, wrapped for retries when asked to
    pub fn build_oracle(config: &OracleConfig) -> Result<Arc<dyn Oracle>> {
        let endpoint = config.get_endpoint();
        let model = config.get_model();

        let backend: Arc<dyn Oracle> = match config.provider {
            OracleProvider::Ollama => Arc::new(
                OllamaOracle::new_with_config(&endpoint, model, config.timeout_secs, config.temperature)
                    .context("Failed to create Ollama client")?,
            ),
            OracleProvider::Anthropic => Arc::new(
                AnthropicOracle::new(&config.api_key, endpoint, model, config.timeout_secs, config.temperature)
                    .context("Failed to create Anthropic client")?,
            ),
            OracleProvider::Extractive => return Ok(Arc::new(ExtractiveOracle::new())),
        };

        if config.retry_count == 0 {
            return Ok(backend);
        }
        Ok(Arc::new(RetryingOracle::new(backend, config.retry_count, config.retry_backoff_ms)))
    }

    /// Output path of the highlight for the configured video
    pub fn output_path(&self) -> PathBuf {
        FileManager::generate_output_path(&self.config.source_video, &self.config.assembly.container)
    }

    /// Decode the subtitle source into a timeline
    pub fn load_timeline(&self) -> Result<Timeline, SummaryError> {
        let subtitle_path = self.config.subtitle_path();
        let timeline = SubtitleDecoder::load(&subtitle_path)?;
        info!(
            "Loaded {} subtitle units from {}",
            timeline.unit_count(),
            subtitle_path.display()
        );
        Ok(timeline)
    }

    /// Run the whole pipeline and return the path of the written highlight
    pub async fn run(&self, force_overwrite: bool) -> Result<PathBuf> {
        let start_time = std::time::Instant::now();
        let video = self.config.source_video.clone();

        if !FileManager::file_exists(&video) {
            return Err(anyhow!("Input video does not exist: {}", video.display()));
        }
        if FileManager::detect_file_type(&video)? != FileType::Video {
            warn!("{} does not look like a video file, trying anyway", video.display());
        }

        let output_path = self.output_path();
        FileManager::check_output_writable(&output_path, force_overwrite)?;

        if let Some(music) = &self.config.music_track {
            if !FileManager::file_exists(music) {
                return Err(anyhow!("Music track does not exist: {}", music.display()));
            }
        }

        // Decode both sources before the first oracle call
        let timeline = self.load_timeline()?;
        let media_info = self
            .ffmpeg
            .probe(&video)
            .await
            .map_err(|e| SummaryError::Decode(format!("{}: {}", video.display(), e)))?;
        debug!("Source media: {:?}", media_info);

        info!("Checking oracle: {}", self.oracle.describe());
        self.oracle
            .test_connection()
            .await
            .map_err(SummaryError::OracleUnavailable)?;

        let summary = self.select(&timeline).await?;

        let work_dir = tempfile::tempdir().context("Failed to create working directory")?;
        let assembled = work_dir
            .path()
            .join(format!("assembled.{}", self.config.assembly.container.trim_start_matches('.')));

        let assembly = &self.config.assembly;
        let assembler = SegmentAssembler::new(
            self.ffmpeg.clone(),
            assembly.fade_secs,
            &assembly.video_codec,
            &assembly.audio_codec,
        );

        let spinner = Self::spinner("Assembling segments");
        assembler
            .assemble(&video, &summary.ranges, media_info.has_audio, &assembled)
            .await?;
        spinner.finish_and_clear();

        match &self.config.music_track {
            Some(music) => {
                let spinner = Self::spinner("Mixing background music");
                let ducker = AudioDucker::new(
                    self.ffmpeg.clone(),
                    self.config.ducking.to_options(),
                    &assembly.audio_codec,
                );
                ducker.duck(&assembled, music, &output_path).await?;
                spinner.finish_and_clear();
            }
            None => {
                std::fs::copy(&assembled, &output_path)
                    .context(format!("Failed to write {}", output_path.display()))?;
            }
        }

        info!(
            "Highlight of {:.1}s written to {} in {}",
            summary.achieved_secs,
            output_path.display(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(output_path)
    }

    /// Filter by audience when keywords are set, then converge on the target duration
    pub async fn select(&self, timeline: &Timeline) -> Result<ConvergedSummary, SummaryError> {
        let keywords = &self.config.demographic_keywords;
        let oracle: &dyn Oracle = &*self.oracle;

        let scoped = if keywords.iter().any(|k| !k.trim().is_empty()) {
            let filter = RelevanceFilter::new(self.config.oracle.concurrent_requests);
            let progress_bar = Self::progress_bar(timeline.unit_count() as u64, "Judging relevance");
            let pb = progress_bar.clone();
            let filtered = filter
                .filter_with_progress(oracle, timeline, keywords, move |done, total| {
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                })
                .await;
            progress_bar.finish_and_clear();
            filtered?
        } else {
            timeline.clone()
        };

        let converger = DurationConverger::new(self.config.convergence.to_options());
        let spinner = Self::spinner("Searching for a summary");
        let pb = spinner.clone();
        let result = converger
            .converge_with_observer(
                oracle,
                &scoped,
                keywords,
                self.config.target_duration_secs,
                move |report: &IterationReport| {
                    pb.set_message(format!(
                        "iteration {}: asked for {} lines, got {:.1}s",
                        report.iteration, report.requested_size, report.achieved_secs
                    ));
                },
            )
            .await;
        spinner.finish_and_clear();
        result
    }

    fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
        let progress_bar = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message(message);
        progress_bar
    }

    fn spinner(message: &'static str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    /// Format a duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
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
}

