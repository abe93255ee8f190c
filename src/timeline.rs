/*!
 * Timeline model over decoded subtitle units.
 *
 * A `Timeline` owns the ordered, immutable sequence of `TimedUnit`s for one
 * pipeline run. Filtering produces a new timeline that keeps the original
 * unit indices, so a unit stays addressable by the index it was parsed with.
 */

use std::fmt;

/// Hour/minute/second/millisecond timestamp as found in subtitle files
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub millis: u32,
}

impl Timestamp {
    pub fn new(hours: u32, minutes: u32, seconds: u32, millis: u32) -> Self {
        Self { hours, minutes, seconds, millis }
    }

    /// Build a timestamp from a millisecond offset
    pub fn from_millis(ms: u64) -> Self {
        Self {
            hours: (ms / 3_600_000) as u32,
            minutes: ((ms % 3_600_000) / 60_000) as u32,
            seconds: ((ms % 60_000) / 1_000) as u32,
            millis: (ms % 1_000) as u32,
        }
    }

    /// Total milliseconds represented by the fields
    pub fn total_millis(&self) -> u64 {
        u64::from(self.hours) * 3_600_000
            + u64::from(self.minutes) * 60_000
            + u64::from(self.seconds) * 1_000
            + u64::from(self.millis)
    }

    /// Seconds with millisecond precision
    pub fn as_secs_f64(&self) -> f64 {
        // Integer milliseconds first so the sub-second part never drifts.
        self.total_millis() as f64 / 1000.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02},{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

/// One subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct TimedUnit {
    /// Position of the cue in its subtitle file; skipped cues leave gaps
    pub index: usize,
    /// Raw entry text
    pub text: String,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimedUnit {
    pub fn new(index: usize, text: impl Into<String>, start: Timestamp, end: Timestamp) -> Self {
        Self {
            index,
            text: text.into(),
            start,
            end,
        }
    }

    /// Whether the text is a bracketed annotation such as `[music]`
    pub fn is_non_speech(&self) -> bool {
        let trimmed = self.text.trim();
        trimmed.starts_with('[') && trimmed.ends_with(']')
    }

    /// Text flattened onto a single line for oracle consumption
    pub fn flattened_text(&self) -> String {
        self.text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A `(start, end)` pair in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s-{:.3}s", self.start, self.end)
    }
}

/// Ordered, immutable sequence of timed units in scope for a run
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    units: Vec<TimedUnit>,
}

impl Timeline {
    /// Create a timeline; units are kept sorted by their index
    pub fn new(mut units: Vec<TimedUnit>) -> Self {
        units.sort_by_key(|unit| unit.index);
        units.dedup_by_key(|unit| unit.index);
        Self { units }
    }

    /// Number of units currently in scope
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[TimedUnit] {
        &self.units
    }

    /// Look up a live unit by its original index
    pub fn get(&self, index: usize) -> Option<&TimedUnit> {
        self.units
            .binary_search_by_key(&index, |unit| unit.index)
            .ok()
            .map(|pos| &self.units[pos])
    }

    /// Convert a unit's timestamp fields into a time range in seconds
    pub fn range_of(unit: &TimedUnit) -> TimeRange {
        TimeRange::new(unit.start.as_secs_f64(), unit.end.as_secs_f64())
    }

    /// Sum of `end - start` over the ranges
    pub fn total_duration(ranges: &[TimeRange]) -> f64 {
        ranges.iter().map(|range| range.end - range.start).sum()
    }

    /// Ranges of every unit in scope, in timeline order
    pub fn ranges(&self) -> Vec<TimeRange> {
        self.units.iter().map(Self::range_of).collect()
    }

    /// Mean duration of a unit in scope, or zero for an empty timeline
    pub fn mean_unit_duration(&self) -> f64 {
        if self.units.is_empty() {
            return 0.0;
        }
        Self::total_duration(&self.ranges()) / self.units.len() as f64
    }

    /// Render every speech unit as an index-tagged line
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for unit in self.units.iter().filter(|unit| !unit.is_non_speech()) {
            text.push_str(&format!("({}) {}\n", unit.index, unit.flattened_text()));
        }
        text
    }

    /// New timeline restricted to the given indices; unknown indices are ignored
    pub fn restricted_to(&self, indices: &[usize]) -> Timeline {
        let units = indices
            .iter()
            .filter_map(|&index| self.get(index).cloned())
            .collect();
        Timeline::new(units)
    }
}
