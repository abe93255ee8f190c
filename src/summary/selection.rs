use log::debug;

use crate::errors::SummaryError;
use crate::prompts::parse_indexed_lines;
use crate::timeline::{TimeRange, Timeline};

/// Ordered unit indices chosen by the oracle, each resolving to a live unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    /// Resolve raw indices against a timeline
    ///
    /// Indices without a live unit are dropped, as are repeats of an index
    /// already selected. Order is otherwise preserved.
    pub fn resolve(raw: &[usize], timeline: &Timeline) -> Self {
        let mut indices = Vec::with_capacity(raw.len());
        for &index in raw {
            if timeline.get(index).is_none() {
                debug!("Dropping index {} with no unit in scope", index);
                continue;
            }
            if indices.contains(&index) {
                debug!("Dropping repeated index {}", index);
                continue;
            }
            indices.push(index);
        }
        Self { indices }
    }

    /// Parse an oracle summary and resolve it against a timeline
    pub fn from_oracle_output(text: &str, timeline: &Timeline) -> Result<Self, SummaryError> {
        let raw = parse_indexed_lines(text);
        if raw.is_empty() {
            return Err(SummaryError::MalformedOracleOutput(
                "no `(index) text` lines in the summary".to_string(),
            ));
        }

        let selection = Self::resolve(&raw, timeline);
        if selection.is_empty() {
            return Err(SummaryError::MalformedOracleOutput(format!(
                "none of the {} parsed indices refer to a unit in scope",
                raw.len()
            )));
        }
        Ok(selection)
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Time ranges in selection order
    pub fn ranges(&self, timeline: &Timeline) -> Vec<TimeRange> {
        self.indices
            .iter()
            .filter_map(|&index| timeline.get(index))
            .map(Timeline::range_of)
            .collect()
    }

    /// Total playback time of the selected units
    pub fn duration(&self, timeline: &Timeline) -> f64 {
        Timeline::total_duration(&self.ranges(timeline))
    }
}
