/*!
 * Codec layer driven through ffmpeg.
 *
 * - `ffmpeg`: subprocess runner, probing and silence detection
 * - `assembler`: cut and join ranges with fades
 * - `ducker`: mix a ducked music bed under the clip audio
 */

pub mod assembler;
pub mod ducker;
pub mod ffmpeg;

// Re-export main types
pub use assembler::{PlannedSegment, SegmentAssembler, SegmentPlan};
pub use ducker::{AudioDucker, DuckingOptions, DuckingPlan};
pub use ffmpeg::{Ffmpeg, MediaInfo};
