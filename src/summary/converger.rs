/*!
 * Duration-targeted summary search.
 *
 * The oracle is told how many lines to return but does not reliably comply,
 * so the converger measures the playback time of every summary it gets back
 * and nudges the requested size by one unit until the achieved duration lands
 * inside `[target - tolerance, target + tolerance]`.
 *
 * Termination is bounded by `max_iterations` (by default the number of units
 * in scope). A target whose band lies beyond the combined duration of all
 * units in scope fails before any oracle call. A summary that resolves to nothing counts as zero seconds for
 * that iteration and never satisfies the band.
 */

use log::{debug, info, warn};

use crate::errors::SummaryError;
use crate::prompts::SummaryPrompt;
use crate::providers::Oracle;
use crate::timeline::{TimeRange, Timeline};

use super::selection::Selection;

/// Tuning knobs for the search
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConvergenceOptions {
    /// Half-width of the acceptance band in seconds; mean unit duration when unset
    pub tolerance_secs: Option<f64>,
    /// Upper bound on oracle calls; unit count when unset
    pub max_iterations: Option<usize>,
}

/// What one iteration asked for and got back
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    /// 1-based iteration number
    pub iteration: usize,
    /// Size estimate sent to the oracle
    pub requested_size: usize,
    /// Total duration of the resolved summary
    pub achieved_secs: f64,
    /// Number of units that resolved
    pub selected_units: usize,
}

/// A converged selection and its time ranges
#[derive(Debug, Clone)]
pub struct ConvergedSummary {
    pub selection: Selection,
    /// Ranges in selection order
    pub ranges: Vec<TimeRange>,
    pub achieved_secs: f64,
    /// Oracle calls it took
    pub iterations: usize,
}

/// Searches for a summary whose duration matches a target
#[derive(Debug, Clone, Default)]
pub struct DurationConverger {
    prompt: SummaryPrompt,
    options: ConvergenceOptions,
}

impl DurationConverger {
    pub fn new(options: ConvergenceOptions) -> Self {
        Self {
            prompt: SummaryPrompt::default(),
            options,
        }
    }

    pub fn with_prompt(mut self, prompt: SummaryPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    /// Initial size estimate for a target, clamped to `[1, unit_count]`
    pub fn initial_estimate(timeline: &Timeline, target_secs: f64) -> usize {
        let unit_count = timeline.unit_count().max(1);
        let mean = timeline.mean_unit_duration();
        if mean <= 0.0 {
            return 1;
        }
        let estimate = (target_secs / mean).round();
        if estimate < 1.0 {
            1
        } else {
            (estimate as usize).min(unit_count)
        }
    }

    /// Run the search without observing iterations
    pub async fn converge(
        &self,
        oracle: &dyn Oracle,
        timeline: &Timeline,
        keywords: &[String],
        target_secs: f64,
    ) -> Result<ConvergedSummary, SummaryError> {
        self.converge_with_observer(oracle, timeline, keywords, target_secs, |_| {}).await
    }

    /// Run the search, calling `observer` after every iteration
    pub async fn converge_with_observer(
        &self,
        oracle: &dyn Oracle,
        timeline: &Timeline,
        keywords: &[String],
        target_secs: f64,
        mut observer: impl FnMut(&IterationReport) + Send,
    ) -> Result<ConvergedSummary, SummaryError> {
        if timeline.is_empty() {
            return Err(SummaryError::EmptySelection("no units in scope to summarize".to_string()));
        }

        let unit_count = timeline.unit_count();
        let tolerance = self.options.tolerance_secs.unwrap_or_else(|| timeline.mean_unit_duration());
        let max_iterations = self.options.max_iterations.unwrap_or(unit_count).max(1);
        let lower = target_secs - tolerance;
        let upper = target_secs + tolerance;

        // No selection can play longer than every unit in scope together
        let reachable = Timeline::total_duration(&timeline.ranges());
        if reachable < lower {
            warn!(
                "Target {:.2}s is out of reach: all {} units in scope play for {:.2}s",
                target_secs, unit_count, reachable
            );
            return Err(SummaryError::ConvergenceFailure {
                iterations: 0,
                last_requested: unit_count,
                last_achieved: reachable,
                target: target_secs,
            });
        }

        let mut requested = Self::initial_estimate(timeline, target_secs);
        let mut achieved = 0.0;

        info!(
            "Searching for a {:.2}s summary (band {:.2}s-{:.2}s, {} units, start at {} lines)",
            target_secs, lower, upper, unit_count, requested
        );

        for iteration in 1..=max_iterations {
            let request = self.prompt.request(keywords, timeline, requested);
            let answer = oracle.query(&request).await?;

            let selection = match Selection::from_oracle_output(&answer, timeline) {
                Ok(selection) => selection,
                Err(e) => {
                    warn!("Iteration {}: {}", iteration, e);
                    Selection::default()
                }
            };
            let ranges = selection.ranges(timeline);
            achieved = Timeline::total_duration(&ranges);

            let report = IterationReport {
                iteration,
                requested_size: requested,
                achieved_secs: achieved,
                selected_units: selection.len(),
            };
            debug!("{:?}", report);
            observer(&report);

            if !selection.is_empty() && achieved >= lower && achieved <= upper {
                info!(
                    "Converged after {} iteration(s): {} units, {:.2}s",
                    iteration,
                    selection.len(),
                    achieved
                );
                return Ok(ConvergedSummary {
                    selection,
                    ranges,
                    achieved_secs: achieved,
                    iterations: iteration,
                });
            }

            if iteration == max_iterations {
                break;
            }

            requested = if achieved < lower {
                (requested + 1).min(unit_count)
            } else {
                requested.saturating_sub(1).max(1)
            };
        }

        Err(SummaryError::ConvergenceFailure {
            iterations: max_iterations,
            last_requested: requested,
            last_achieved: achieved,
            target: target_secs,
        })
    }
}
