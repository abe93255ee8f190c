use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::media::DuckingOptions;
use crate::summary::ConvergenceOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Video to summarize
    #[serde(default)]
    pub source_video: PathBuf,

    /// Subtitle file; the video path with an `.srt` extension when unset
    #[serde(default)]
    pub subtitle_source: Option<PathBuf>,

    /// Duration the highlight should approximate, in seconds
    #[serde(default = "default_target_duration_secs")]
    pub target_duration_secs: f64,

    /// Audience keywords; empty means no relevance filtering
    #[serde(default)]
    pub demographic_keywords: Vec<String>,

    /// Background music laid under the highlight
    #[serde(default)]
    pub music_track: Option<PathBuf>,

    /// Oracle config
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Duration search config
    #[serde(default)]
    pub convergence: ConvergenceConfig,

    /// Encoding config
    #[serde(default)]
    pub assembly: AssemblyConfig,

    /// Music bed config
    #[serde(default)]
    pub ducking: DuckingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Oracle backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: Anthropic
    Anthropic,
    // @provider: Offline extractive summarizer
    Extractive,
}

impl OracleProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
            Self::Extractive => "Extractive",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Extractive => "extractive".to_string(),
        }
    }

    pub fn default_endpoint(&self) -> String {
        match self {
            Self::Ollama => default_ollama_endpoint(),
            Self::Anthropic => default_anthropic_endpoint(),
            Self::Extractive => String::new(),
        }
    }

    pub fn default_model(&self) -> String {
        match self {
            Self::Ollama => default_ollama_model(),
            Self::Anthropic => default_anthropic_model(),
            Self::Extractive => "kl-sum".to_string(),
        }
    }
}

// Implement Display trait for OracleProvider
impl std::fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for OracleProvider
impl std::str::FromStr for OracleProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            "extractive" => Ok(Self::Extractive),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Oracle service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OracleConfig {
    /// Backend to use
    #[serde(default)]
    pub provider: OracleProvider,

    /// Service endpoint URL; provider default when empty
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Model name; provider default when empty
    #[serde(default = "String::new")]
    pub model: String,

    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Maximum number of concurrent relevance requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Retry count for transient failures; zero disables retrying
    #[serde(default)]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: OracleProvider::default(),
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            api_key: String::new(),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            retry_count: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl OracleConfig {
    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if self.endpoint.trim().is_empty() {
            self.provider.default_endpoint()
        } else {
            self.endpoint.clone()
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if self.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            self.model.clone()
        }
    }
}

/// Duration search configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ConvergenceConfig {
    /// Half-width of the acceptance band; mean unit duration when unset
    #[serde(default)]
    pub tolerance_secs: Option<f64>,

    /// Maximum oracle calls; unit count when unset
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

impl ConvergenceConfig {
    pub fn to_options(&self) -> ConvergenceOptions {
        ConvergenceOptions {
            tolerance_secs: self.tolerance_secs,
            max_iterations: self.max_iterations,
        }
    }
}

/// Encoding configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssemblyConfig {
    /// Fade length at segment joins in seconds
    #[serde(default = "default_fade_secs")]
    pub fade_secs: f64,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Output container extension
    #[serde(default = "default_container")]
    pub container: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            fade_secs: default_fade_secs(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            container: default_container(),
        }
    }
}

/// Music bed configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DuckingConfig {
    /// Music gain under speech (0.0 to 1.0)
    #[serde(default = "default_speech_gain")]
    pub speech_gain: f64,

    /// Music gain outside speech (0.0 to 1.0)
    #[serde(default = "default_silence_gain")]
    pub silence_gain: f64,

    /// Noise floor for silence detection in dB
    #[serde(default = "default_silence_threshold_db")]
    pub silence_threshold_db: f64,

    /// Shortest pause that counts as silence
    #[serde(default = "default_min_silence_secs")]
    pub min_silence_secs: f64,
}

impl Default for DuckingConfig {
    fn default() -> Self {
        Self {
            speech_gain: default_speech_gain(),
            silence_gain: default_silence_gain(),
            silence_threshold_db: default_silence_threshold_db(),
            min_silence_secs: default_min_silence_secs(),
        }
    }
}

impl DuckingConfig {
    pub fn to_options(&self) -> DuckingOptions {
        DuckingOptions {
            speech_gain: self.speech_gain,
            silence_gain: self.silence_gain,
            silence_threshold_db: self.silence_threshold_db,
            min_silence_secs: self.min_silence_secs,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_duration_secs() -> f64 {
    120.0
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_fade_secs() -> f64 {
    0.5
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_speech_gain() -> f64 {
    0.15
}

fn default_silence_gain() -> f64 {
    0.6
}

fn default_silence_threshold_db() -> f64 {
    -35.0
}

fn default_min_silence_secs() -> f64 {
    0.4
}

impl Config {
    /// Load the configuration file, writing a default one if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .context(format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Subtitle file for the source video
    pub fn subtitle_path(&self) -> PathBuf {
        match &self.subtitle_source {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => self.source_video.with_extension("srt"),
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source_video.as_os_str().is_empty() {
            return Err(anyhow!("A source video is required"));
        }

        if !(self.target_duration_secs.is_finite() && self.target_duration_secs > 0.0) {
            return Err(anyhow!(
                "Target duration must be a positive number of seconds, got {}",
                self.target_duration_secs
            ));
        }

        if self.oracle.concurrent_requests == 0 {
            return Err(anyhow!("Concurrent requests must be at least 1"));
        }

        if self.oracle.provider == OracleProvider::Anthropic && self.oracle.api_key.trim().is_empty() {
            return Err(anyhow!("Oracle API key is required for Anthropic provider"));
        }

        if let Some(tolerance) = self.convergence.tolerance_secs {
            if !(tolerance.is_finite() && tolerance >= 0.0) {
                return Err(anyhow!("Tolerance must be a non-negative number of seconds, got {}", tolerance));
            }
        }

        if self.assembly.fade_secs < 0.0 {
            return Err(anyhow!("Fade duration cannot be negative"));
        }

        let ducking = &self.ducking;
        for (name, gain) in [("speech_gain", ducking.speech_gain), ("silence_gain", ducking.silence_gain)] {
            if !(0.0..=1.0).contains(&gain) {
                return Err(anyhow!("{} must be between 0 and 1, got {}", name, gain));
            }
        }
        if ducking.speech_gain >= ducking.silence_gain {
            return Err(anyhow!(
                "speech_gain ({}) must be lower than silence_gain ({})",
                ducking.speech_gain,
                ducking.silence_gain
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_video: PathBuf::new(),
            subtitle_source: None,
            target_duration_secs: default_target_duration_secs(),
            demographic_keywords: Vec::new(),
            music_track: None,
            oracle: OracleConfig::default(),
            convergence: ConvergenceConfig::default(),
            assembly: AssemblyConfig::default(),
            ducking: DuckingConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
