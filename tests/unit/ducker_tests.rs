/*!
 * Tests for speech detection and the ducked music bed
 */

use std::path::Path;

use yashwai::media::ducker::speech_intervals;
use yashwai::media::ffmpeg::parse_silencedetect;
use yashwai::media::{AudioDucker, DuckingOptions, DuckingPlan, Ffmpeg};
use yashwai::timeline::TimeRange;

const SILENCEDETECT_LOG: &str = "\
[silencedetect @ 0x55d0c1a2b3c0] silence_start: 0
[silencedetect @ 0x55d0c1a2b3c0] silence_end: 1.2 | silence_duration: 1.2
size=N/A time=00:00:05.00 bitrate=N/A speed= 250x
[silencedetect @ 0x55d0c1a2b3c0] silence_start: 4.5
[silencedetect @ 0x55d0c1a2b3c0] silence_end: 6 | silence_duration: 1.5
[silencedetect @ 0x55d0c1a2b3c0] silence_start: 9.25
";

#[test]
fn test_parse_silencedetect_withOpenTrailingSilence_shouldRunToEnd() {
    let silences = parse_silencedetect(SILENCEDETECT_LOG, 10.0);

    assert_eq!(
        silences,
        vec![TimeRange::new(0.0, 1.2), TimeRange::new(4.5, 6.0), TimeRange::new(9.25, 10.0)]
    );
}

#[test]
fn test_speech_intervals_fromSilenceLog_shouldCoverTheGaps() {
    let speech = speech_intervals(&parse_silencedetect(SILENCEDETECT_LOG, 10.0), 10.0);

    assert_eq!(speech, vec![TimeRange::new(1.2, 4.5), TimeRange::new(6.0, 9.25)]);
}

#[test]
fn test_speech_intervals_withoutSilence_shouldBeWholeClip() {
    assert_eq!(speech_intervals(&[], 7.5), vec![TimeRange::new(0.0, 7.5)]);
}

#[test]
fn test_music_contribution_underSpeech_shouldBeLowerThanInSilence() {
    let options = DuckingOptions::default();
    let plan = DuckingPlan::new(
        10.0,
        vec![TimeRange::new(1.0, 4.0), TimeRange::new(6.0, 9.0)],
        options.speech_gain,
        options.silence_gain,
    );

    let during_speech = plan.music_contribution(TimeRange::new(1.5, 3.5));
    let during_silence = plan.music_contribution(TimeRange::new(4.0, 6.0));

    assert!(during_speech < during_silence);
    assert!((during_speech - 2.0 * 0.15).abs() < 1e-9);
    assert!((during_silence - 2.0 * 0.6).abs() < 1e-9);
}

#[test]
fn test_gain_at_shouldSwitchAtSpeechBoundaries() {
    let plan = DuckingPlan::new(5.0, vec![TimeRange::new(2.0, 3.0)], 0.1, 0.9);

    assert_eq!(plan.gain_at(1.0), 0.9);
    assert_eq!(plan.gain_at(2.5), 0.1);
    assert_eq!(plan.gain_at(4.0), 0.9);
}

#[test]
fn test_filter_graph_withClipAudio_shouldMixWithoutNormalizing() {
    let plan = DuckingPlan::new(4.0, vec![TimeRange::new(0.5, 1.5)], 0.25, 0.5);

    let graph = plan.filter_graph(true, 44_100);

    assert_eq!(
        graph,
        "[1:a]atrim=start=0:end=4.000,asetpts=PTS-STARTPTS,volume=0.5000,\
volume=0.5000:enable='between(t,0.500,1.500)'[bed];\
[0:a][bed]amix=inputs=2:duration=first:normalize=0,aresample=44100[outa]"
    );
}

#[test]
fn test_filter_graph_withSilentClip_shouldUseBedOnly() {
    let plan = DuckingPlan::new(3.0, Vec::new(), 0.2, 0.7);

    let graph = plan.filter_graph(false, 48_000);

    assert!(!graph.contains("amix"));
    assert!(!graph.contains("enable="));
    assert!(graph.ends_with("[bed]aresample=48000[outa]"));
}

#[test]
fn test_render_args_shouldLoopMusicAndCopyVideo() {
    let ducker = AudioDucker::new(Ffmpeg::default(), DuckingOptions::default(), "aac");
    let plan = DuckingPlan::new(12.0, vec![TimeRange::new(0.0, 12.0)], 0.15, 0.6);

    let args = ducker.render_args(&plan, Path::new("clip.mp4"), Path::new("bed.mp3"), true, 48_000, Path::new("out.mp4"));

    let joined = args.join(" ");
    assert!(joined.contains("-stream_loop -1 -i bed.mp3"));
    assert!(joined.contains("-c:v copy"));
    assert!(joined.contains("-ar 48000"));
    assert!(joined.contains("-t 12.000"));
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
}
