/*!
 * Background-music ducking.
 *
 * The music bed is looped or cut to the clip's length and played at
 * `silence_gain`, dropping to `speech_gain` wherever the clip's own audio
 * carries speech. Speech is everything `silencedetect` does not report as
 * silent. The bed is added to the clip audio rather than replacing it.
 */

use log::{info, warn};
use std::fmt::Write as _;
use std::path::Path;

use crate::errors::MediaError;
use crate::timeline::TimeRange;

use super::ffmpeg::Ffmpeg;

/// Settings for the music bed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuckingOptions {
    /// Music gain under speech
    pub speech_gain: f64,
    /// Music gain elsewhere
    pub silence_gain: f64,
    /// Level below which audio counts as silent
    pub silence_threshold_db: f64,
    /// Shortest gap that counts as silence
    pub min_silence_secs: f64,
}

impl Default for DuckingOptions {
    fn default() -> Self {
        Self {
            speech_gain: 0.15,
            silence_gain: 0.6,
            silence_threshold_db: -35.0,
            min_silence_secs: 0.4,
        }
    }
}

/// Speech intervals of a clip: the complement of its silences in `[0, total]`
pub fn speech_intervals(silences: &[TimeRange], total_duration: f64) -> Vec<TimeRange> {
    let mut silences: Vec<TimeRange> = silences.to_vec();
    silences.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut speech = Vec::new();
    let mut cursor = 0.0;
    for silence in silences {
        let start = silence.start.clamp(0.0, total_duration);
        let end = silence.end.clamp(0.0, total_duration);
        if start > cursor {
            speech.push(TimeRange::new(cursor, start));
        }
        cursor = f64::max(cursor, end);
    }
    if total_duration > cursor {
        speech.push(TimeRange::new(cursor, total_duration));
    }
    speech
}

/// Gain of the music bed over time
#[derive(Debug, Clone, PartialEq)]
pub struct DuckingPlan {
    total_duration: f64,
    speech: Vec<TimeRange>,
    speech_gain: f64,
    silence_gain: f64,
}

impl DuckingPlan {
    /// `speech` must be ordered and non-overlapping, as from `speech_intervals`
    pub fn new(total_duration: f64, speech: Vec<TimeRange>, speech_gain: f64, silence_gain: f64) -> Self {
        Self {
            total_duration,
            speech,
            speech_gain: speech_gain.clamp(0.0, 1.0),
            silence_gain: silence_gain.clamp(0.0, 1.0),
        }
    }

    pub fn speech(&self) -> &[TimeRange] {
        &self.speech
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Music gain at time `t`
    pub fn gain_at(&self, t: f64) -> f64 {
        if self.speech.iter().any(|r| t >= r.start && t <= r.end) {
            self.speech_gain
        } else {
            self.silence_gain
        }
    }

    /// Integral of the music gain over `range`, for a bed of constant level
    pub fn music_contribution(&self, range: TimeRange) -> f64 {
        let ducked: f64 = self
            .speech
            .iter()
            .map(|r| (r.end.min(range.end) - r.start.max(range.start)).max(0.0))
            .sum();
        let open = range.duration() - ducked;
        ducked * self.speech_gain + open * self.silence_gain
    }

    /// Filter chain turning input `[1:a]` into the ducked bed `[bed]`
    pub fn music_filter(&self) -> String {
        let mut chain = format!(
            "[1:a]atrim=start=0:end={:.3},asetpts=PTS-STARTPTS,volume={:.4}",
            self.total_duration, self.silence_gain
        );

        let ratio = if self.silence_gain > 0.0 {
            self.speech_gain / self.silence_gain
        } else {
            0.0
        };
        for range in &self.speech {
            let _ = write!(
                chain,
                ",volume={:.4}:enable='between(t,{:.3},{:.3})'",
                ratio, range.start, range.end
            );
        }
        chain.push_str("[bed]");
        chain
    }

    /// Full graph producing `[outa]` at `sample_rate`
    pub fn filter_graph(&self, clip_has_audio: bool, sample_rate: u32) -> String {
        if clip_has_audio {
            format!(
                "{};[0:a][bed]amix=inputs=2:duration=first:normalize=0,aresample={}[outa]",
                self.music_filter(),
                sample_rate
            )
        } else {
            format!("{};[bed]aresample={}[outa]", self.music_filter(), sample_rate)
        }
    }
}

/// Lays a ducked music bed under an assembled clip
#[derive(Debug, Clone)]
pub struct AudioDucker {
    ffmpeg: Ffmpeg,
    options: DuckingOptions,
    audio_codec: String,
}

/// Sample rate used when the clip has no audio of its own
const FALLBACK_SAMPLE_RATE: u32 = 48_000;

impl AudioDucker {
    pub fn new(ffmpeg: Ffmpeg, options: DuckingOptions, audio_codec: impl Into<String>) -> Self {
        Self {
            ffmpeg,
            options,
            audio_codec: audio_codec.into(),
        }
    }

    /// Detect speech in `clip` and build its ducking plan
    pub async fn plan(&self, clip: &Path) -> Result<(DuckingPlan, u32, bool), MediaError> {
        let info = self.ffmpeg.probe(clip).await?;

        let speech = if info.has_audio {
            let silences = self
                .ffmpeg
                .detect_silence(clip, self.options.silence_threshold_db, self.options.min_silence_secs, info.duration_secs)
                .await?;
            speech_intervals(&silences, info.duration_secs)
        } else {
            Vec::new()
        };

        if speech.is_empty() {
            warn!("No speech detected in {}, music stays at full bed level", clip.display());
        }

        let plan = DuckingPlan::new(info.duration_secs, speech, self.options.speech_gain, self.options.silence_gain);
        let sample_rate = info.sample_rate.unwrap_or(FALLBACK_SAMPLE_RATE);
        Ok((plan, sample_rate, info.has_audio))
    }

    /// ffmpeg arguments mixing the bed from `music` under `clip` into `output`
    pub fn render_args(
        &self,
        plan: &DuckingPlan,
        clip: &Path,
        music: &Path,
        clip_has_audio: bool,
        sample_rate: u32,
        output: &Path,
    ) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(), clip.to_string_lossy().into_owned(),
            "-stream_loop".to_string(), "-1".to_string(),
            "-i".to_string(), music.to_string_lossy().into_owned(),
            "-filter_complex".to_string(), plan.filter_graph(clip_has_audio, sample_rate),
            "-map".to_string(), "0:v".to_string(),
            "-map".to_string(), "[outa]".to_string(),
            "-c:v".to_string(), "copy".to_string(),
            "-c:a".to_string(), self.audio_codec.clone(),
            "-ar".to_string(), sample_rate.to_string(),
            "-t".to_string(), format!("{:.3}", plan.total_duration()),
            output.to_string_lossy().into_owned(),
        ]
    }

    /// Mix a ducked bed from `music` under `clip`, writing `output`
    pub async fn duck(&self, clip: &Path, music: &Path, output: &Path) -> Result<DuckingPlan, MediaError> {
        let (plan, sample_rate, has_audio) = self.plan(clip).await?;
        info!(
            "Ducking music under {} speech interval(s) over {:.2}s at {} Hz",
            plan.speech().len(),
            plan.total_duration(),
            sample_rate
        );

        let args = self.render_args(&plan, clip, music, has_audio, sample_rate, output);
        self.ffmpeg.run("ffmpeg", &args).await?;
        Ok(plan)
    }
}
