use std::fs;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{warn, debug};

use crate::errors::SubtitleError;
use crate::timeline::{Timeline, TimedUnit, Timestamp};

// @module: Subtitle decoding into timed units

// @const: SRT timestamp line regex, accepts both ',' and '.' before millis
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

/// Character encoding detected for a raw subtitle file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    /// Windows-1252 / Latin-1 single byte fallback
    Latin1,
}

/// Subtitle decoding entry points
pub struct SubtitleDecoder;

impl SubtitleDecoder {
    /// Read and decode a subtitle file into a timeline
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Timeline, SubtitleError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| SubtitleError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let (content, encoding) = Self::decode_bytes(&bytes);
        debug!("Decoded {:?} as {:?} ({} bytes)", path, encoding, bytes.len());

        Self::parse_srt_string(&content).map(Timeline::new)
    }

    /// Detect the encoding of raw bytes
    pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
        if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            return TextEncoding::Utf8;
        }
        if bytes.starts_with(&[0xFF, 0xFE]) {
            return TextEncoding::Utf16Le;
        }
        if bytes.starts_with(&[0xFE, 0xFF]) {
            return TextEncoding::Utf16Be;
        }
        if std::str::from_utf8(bytes).is_ok() {
            return TextEncoding::Utf8;
        }
        TextEncoding::Latin1
    }

    /// Decode raw bytes to text using the detected encoding
    pub fn decode_bytes(bytes: &[u8]) -> (String, TextEncoding) {
        let encoding = Self::detect_encoding(bytes);
        let text = match encoding {
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(bytes);
                String::from_utf8_lossy(body).into_owned()
            }
            TextEncoding::Utf16Le => Self::decode_utf16(&bytes[2..], u16::from_le_bytes),
            TextEncoding::Utf16Be => Self::decode_utf16(&bytes[2..], u16::from_be_bytes),
            TextEncoding::Latin1 => bytes.iter().map(|&b| Self::cp1252_char(b)).collect(),
        };
        (text, encoding)
    }

    fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| to_unit([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    }

    // Windows-1252 differs from Latin-1 only in 0x80..=0x9F
    fn cp1252_char(byte: u8) -> char {
        const HIGH: [char; 32] = [
            '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8D}', 'Ž', '\u{8F}',
            '\u{90}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{9D}', 'ž', 'Ÿ',
        ];
        match byte {
            0x80..=0x9F => HIGH[(byte - 0x80) as usize],
            _ => byte as char,
        }
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) into its fields
    pub fn parse_timestamp(timestamp: &str) -> Result<Timestamp, SubtitleError> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(SubtitleError::InvalidTimestamp(timestamp.to_string()));
        }

        let field = |s: &str| {
            s.parse::<u32>()
                .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))
        };
        let ts = Timestamp::new(field(parts[0])?, field(parts[1])?, field(parts[2])?, field(parts[3])?);

        if ts.minutes >= 60 || ts.seconds >= 60 || ts.millis >= 1000 {
            return Err(SubtitleError::InvalidTimestamp(timestamp.to_string()));
        }

        Ok(ts)
    }

    /// Parse SRT content into timed units
    ///
    /// Each cue is indexed by its position among the cues of the file, so a
    /// cue that is skipped (bad timestamps, no text, end not after start)
    /// leaves a gap instead of shifting the indices of the cues after it.
    pub fn parse_srt_string(content: &str) -> Result<Vec<TimedUnit>, SubtitleError> {
        let lines: Vec<&str> = content
            .lines()
            .map(|line| line.trim().trim_start_matches('\u{feff}'))
            .collect();

        let mut units: Vec<TimedUnit> = Vec::new();
        let mut current: Option<(usize, Timestamp, Timestamp)> = None;
        let mut current_text = String::new();
        let mut skipping_cue = false;
        let mut cue_position = 0;

        let finish = |cue: Option<(usize, Timestamp, Timestamp)>, text: &mut String, units: &mut Vec<TimedUnit>| {
            if let Some((position, start, end)) = cue {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    warn!("Skipping empty subtitle entry at {}", start);
                } else if end <= start {
                    warn!("Skipping subtitle entry with invalid time range {} --> {}", start, end);
                } else {
                    units.push(TimedUnit::new(position, trimmed, start, end));
                }
            }
            text.clear();
        };

        for (line_no, &line) in lines.iter().enumerate() {
            if line.is_empty() {
                finish(current.take(), &mut current_text, &mut units);
                skipping_cue = false;
                continue;
            }

            // A bare number directly above a timing line opens the next cue,
            // even when the previous cue was not closed by a blank line
            let precedes_timing = lines
                .get(line_no + 1)
                .is_some_and(|next| TIMESTAMP_REGEX.is_match(next));
            if precedes_timing && line.parse::<usize>().is_ok() {
                finish(current.take(), &mut current_text, &mut units);
                skipping_cue = false;
                continue;
            }

            if let Some(caps) = TIMESTAMP_REGEX.captures(line) {
                finish(current.take(), &mut current_text, &mut units);
                let position = cue_position;
                cue_position += 1;

                match (Self::timestamp_from_caps(&caps, 1), Self::timestamp_from_caps(&caps, 5)) {
                    (Ok(start), Ok(end)) => {
                        current = Some((position, start, end));
                        skipping_cue = false;
                    }
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Skipping subtitle entry at line {}: {}", line_no + 1, e);
                        skipping_cue = true;
                    }
                }
                continue;
            }

            if current.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(line);
            } else if !skipping_cue {
                warn!("Unexpected text at line {} before a timestamp: {}", line_no + 1, line);
            }
        }

        finish(current.take(), &mut current_text, &mut units);

        if units.is_empty() {
            return Err(SubtitleError::NoEntries(
                "the content holds no timed entries with text".to_string(),
            ));
        }

        Ok(units)
    }

    fn timestamp_from_caps(caps: &regex::Captures, start_idx: usize) -> Result<Timestamp, SubtitleError> {
        let raw = format!(
            "{}:{}:{},{}",
            &caps[start_idx],
            &caps[start_idx + 1],
            &caps[start_idx + 2],
            &caps[start_idx + 3]
        );
        Self::parse_timestamp(&raw)
    }
}
