/*!
 * ffmpeg and ffprobe subprocess helpers.
 */

use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::errors::MediaError;
use crate::timeline::TimeRange;

/// Default time budget for one ffmpeg invocation
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

static SILENCE_START_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"silence_start:\s*(-?\d+(?:\.\d+)?)").unwrap()
});

static SILENCE_END_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"silence_end:\s*(-?\d+(?:\.\d+)?)").unwrap()
});

/// What ffprobe reports about a media file
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds
    pub duration_secs: f64,
    /// Sample rate of the first audio stream
    pub sample_rate: Option<u32>,
    pub has_audio: bool,
    pub has_video: bool,
}

/// Runs ffmpeg and ffprobe with a shared timeout
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    timeout: Duration,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

impl Ffmpeg {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Run a tool to completion, failing on timeout or non-zero exit
    pub async fn run(&self, tool: &str, args: &[String]) -> Result<Output, MediaError> {
        debug!("Running {} {}", tool, args.join(" "));

        let future = Command::new(tool)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = future => {
                result.map_err(|e| MediaError::Spawn {
                    tool: tool.to_string(),
                    message: e.to_string(),
                })?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(MediaError::Timeout {
                    tool: tool.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} failed: {}", tool, filtered);
            return Err(MediaError::Failed {
                tool: tool.to_string(),
                message: filtered,
            });
        }

        Ok(output)
    }

    /// Probe duration and audio properties of a media file
    pub async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        let args = vec![
            "-v".to_string(), "quiet".to_string(),
            "-print_format".to_string(), "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            path.to_string_lossy().into_owned(),
        ];

        let output = self.run("ffprobe", &args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&stdout)
    }

    /// Silent intervals of a file's audio as reported by `silencedetect`
    pub async fn detect_silence(
        &self,
        path: &Path,
        threshold_db: f64,
        min_silence_secs: f64,
        total_duration: f64,
    ) -> Result<Vec<TimeRange>, MediaError> {
        let args = vec![
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            "-i".to_string(), path.to_string_lossy().into_owned(),
            "-map".to_string(), "0:a:0".to_string(),
            "-af".to_string(), format!("silencedetect=noise={}dB:d={}", threshold_db, min_silence_secs),
            "-f".to_string(), "null".to_string(),
            "-".to_string(),
        ];

        let output = self.run("ffmpeg", &args).await?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(parse_silencedetect(&stderr, total_duration))
    }
}

/// Interpret `ffprobe -show_format -show_streams` JSON
pub fn parse_probe_output(json: &str) -> Result<MediaInfo, MediaError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| MediaError::Probe(format!("invalid ffprobe JSON: {}", e)))?;

    let streams = value.get("streams").and_then(|s| s.as_array());
    let stream_of = |kind: &str| {
        streams.and_then(|streams| {
            streams
                .iter()
                .find(|s| s.get("codec_type").and_then(|c| c.as_str()) == Some(kind))
        })
    };

    let audio = stream_of("audio");
    let video = stream_of("video");

    // ffprobe prints numbers as strings
    let duration_secs = value
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::Probe("no container duration in ffprobe output".to_string()))?;

    let sample_rate = audio
        .and_then(|a| a.get("sample_rate"))
        .and_then(|r| r.as_str())
        .and_then(|r| r.parse::<u32>().ok());

    Ok(MediaInfo {
        duration_secs,
        sample_rate,
        has_audio: audio.is_some(),
        has_video: video.is_some(),
    })
}

/// Silent intervals from `silencedetect` log lines
///
/// A trailing `silence_start` without a matching end runs to `total_duration`.
pub fn parse_silencedetect(stderr: &str, total_duration: f64) -> Vec<TimeRange> {
    let mut silences = Vec::new();
    let mut open: Option<f64> = None;

    for line in stderr.lines() {
        if let Some(caps) = SILENCE_START_REGEX.captures(line) {
            if let Ok(start) = caps[1].parse::<f64>() {
                open = Some(start.max(0.0));
            }
        } else if let Some(caps) = SILENCE_END_REGEX.captures(line) {
            if let (Some(start), Ok(end)) = (open.take(), caps[1].parse::<f64>()) {
                let end = end.min(total_duration);
                if end > start {
                    silences.push(TimeRange::new(start, end));
                }
            }
        }
    }

    if let Some(start) = open {
        if total_duration > start {
            silences.push(TimeRange::new(start, total_duration));
        }
    }

    silences
}

/// Filter ffmpeg stderr to only show meaningful error lines
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "libav",
        "libsw",
        "libpostproc",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
