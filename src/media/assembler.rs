/*!
 * Segment assembly.
 *
 * Ranges are cut from the source in the order given and concatenated with
 * short fades at the joins:
 * - the first segment fades out at its end
 * - the last segment fades in at its start
 * - interior segments fade in and out
 *
 * A lone segment follows the first-segment rule. Fades never exceed half of
 * their segment.
 */

use log::info;
use std::fmt::Write as _;
use std::path::Path;

use crate::errors::MediaError;
use crate::timeline::TimeRange;

use super::ffmpeg::Ffmpeg;

/// Default fade length in seconds
pub const DEFAULT_FADE_SECS: f64 = 0.5;

/// One range with its resolved fades
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSegment {
    pub range: TimeRange,
    /// Fade-in length at the segment start, zero for none
    pub fade_in: f64,
    /// Fade-out length at the segment end, zero for none
    pub fade_out: f64,
}

impl PlannedSegment {
    pub fn duration(&self) -> f64 {
        self.range.duration()
    }

    pub fn has_fade_in(&self) -> bool {
        self.fade_in > 0.0
    }

    pub fn has_fade_out(&self) -> bool {
        self.fade_out > 0.0
    }
}

/// Ordered segments ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    segments: Vec<PlannedSegment>,
}

impl SegmentPlan {
    /// Resolve fades for each range by its position
    pub fn new(ranges: &[TimeRange], fade_secs: f64) -> Result<Self, MediaError> {
        if ranges.is_empty() {
            return Err(MediaError::NoSegments);
        }

        let last = ranges.len() - 1;
        let fade_secs = fade_secs.max(0.0);
        let segments = ranges
            .iter()
            .enumerate()
            .map(|(position, range)| {
                let fade = fade_secs.min(range.duration() / 2.0);
                let fades_in = position > 0;
                let fades_out = position < last || last == 0;
                PlannedSegment {
                    range: *range,
                    fade_in: if fades_in { fade } else { 0.0 },
                    fade_out: if fades_out { fade } else { 0.0 },
                }
            })
            .collect();

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PlannedSegment] {
        &self.segments
    }

    /// Length of the concatenated clip
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(PlannedSegment::duration).sum()
    }

    /// `filter_complex` graph producing `[outv]` and, with audio, `[outa]`
    pub fn filter_graph(&self, with_audio: bool) -> String {
        let mut graph = String::new();
        let mut concat_inputs = String::new();

        for (i, segment) in self.segments.iter().enumerate() {
            let (start, end) = (segment.range.start, segment.range.end);
            let duration = segment.duration();

            let _ = write!(graph, "[0:v]trim=start={:.3}:end={:.3},setpts=PTS-STARTPTS", start, end);
            if segment.has_fade_in() {
                let _ = write!(graph, ",fade=t=in:st=0:d={:.3}", segment.fade_in);
            }
            if segment.has_fade_out() {
                let _ = write!(graph, ",fade=t=out:st={:.3}:d={:.3}", duration - segment.fade_out, segment.fade_out);
            }
            let _ = write!(graph, "[v{}];", i);
            let _ = write!(concat_inputs, "[v{}]", i);

            if with_audio {
                let _ = write!(graph, "[0:a]atrim=start={:.3}:end={:.3},asetpts=PTS-STARTPTS", start, end);
                if segment.has_fade_in() {
                    let _ = write!(graph, ",afade=t=in:st=0:d={:.3}", segment.fade_in);
                }
                if segment.has_fade_out() {
                    let _ = write!(graph, ",afade=t=out:st={:.3}:d={:.3}", duration - segment.fade_out, segment.fade_out);
                }
                let _ = write!(graph, "[a{}];", i);
                let _ = write!(concat_inputs, "[a{}]", i);
            }
        }

        if with_audio {
            let _ = write!(graph, "{}concat=n={}:v=1:a=1[outv][outa]", concat_inputs, self.segments.len());
        } else {
            let _ = write!(graph, "{}concat=n={}:v=1:a=0[outv]", concat_inputs, self.segments.len());
        }
        graph
    }
}

/// Cuts and joins ranges of a source video into one clip
#[derive(Debug, Clone)]
pub struct SegmentAssembler {
    ffmpeg: Ffmpeg,
    fade_secs: f64,
    video_codec: String,
    audio_codec: String,
}

impl SegmentAssembler {
    pub fn new(ffmpeg: Ffmpeg, fade_secs: f64, video_codec: impl Into<String>, audio_codec: impl Into<String>) -> Self {
        Self {
            ffmpeg,
            fade_secs,
            video_codec: video_codec.into(),
            audio_codec: audio_codec.into(),
        }
    }

    pub fn plan(&self, ranges: &[TimeRange]) -> Result<SegmentPlan, MediaError> {
        SegmentPlan::new(ranges, self.fade_secs)
    }

    /// ffmpeg arguments rendering `plan` from `source` into `output`
    pub fn render_args(&self, plan: &SegmentPlan, source: &Path, with_audio: bool, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(), source.to_string_lossy().into_owned(),
            "-filter_complex".to_string(), plan.filter_graph(with_audio),
            "-map".to_string(), "[outv]".to_string(),
            "-c:v".to_string(), self.video_codec.clone(),
        ];
        if with_audio {
            args.extend([
                "-map".to_string(), "[outa]".to_string(),
                "-c:a".to_string(), self.audio_codec.clone(),
            ]);
        }
        args.push(output.to_string_lossy().into_owned());
        args
    }

    /// Render the ranges of `source` into `output`
    pub async fn assemble(
        &self,
        source: &Path,
        ranges: &[TimeRange],
        with_audio: bool,
        output: &Path,
    ) -> Result<SegmentPlan, MediaError> {
        let plan = self.plan(ranges)?;
        info!(
            "Assembling {} segments ({:.2}s) into {}",
            plan.segments().len(),
            plan.total_duration(),
            output.display()
        );

        let args = self.render_args(&plan, source, with_audio, output);
        self.ffmpeg.run("ffmpeg", &args).await?;
        Ok(plan)
    }
}
