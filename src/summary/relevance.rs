/*!
 * Per-unit relevance filtering.
 *
 * Every speech unit is judged by one independent oracle query. Queries run
 * concurrently under a bounded permit pool and their answers are matched back
 * to the unit they were asked about, so the output keeps timeline order no
 * matter which query finishes first. The first failed query aborts the whole
 * stage and drops the queries still in flight.
 */

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

use crate::errors::{ProviderError, SummaryError};
use crate::prompts::{RelevancePrompt, is_affirmative};
use crate::providers::Oracle;
use crate::timeline::Timeline;

/// Default number of relevance queries in flight
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Narrows a timeline to the units an oracle judges relevant to an audience
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    prompt: RelevancePrompt,
    max_concurrent_requests: usize,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl RelevanceFilter {
    pub fn new(max_concurrent_requests: usize) -> Self {
        Self {
            prompt: RelevancePrompt::default(),
            max_concurrent_requests: max_concurrent_requests.max(1),
        }
    }

    pub fn with_prompt(mut self, prompt: RelevancePrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    /// Filter a timeline, keeping relevant units in their original order
    pub async fn filter(
        &self,
        oracle: &dyn Oracle,
        timeline: &Timeline,
        keywords: &[String],
    ) -> Result<Timeline, SummaryError> {
        self.filter_with_progress(oracle, timeline, keywords, |_, _| {}).await
    }

    /// Filter a timeline, reporting `(answered, total)` after each answer
    pub async fn filter_with_progress(
        &self,
        oracle: &dyn Oracle,
        timeline: &Timeline,
        keywords: &[String],
        progress_callback: impl Fn(usize, usize) + Clone + Send,
    ) -> Result<Timeline, SummaryError> {
        if timeline.is_empty() {
            return Err(SummaryError::EmptySelection("the timeline has no units to filter".to_string()));
        }

        // Non-speech markers are never asked about and never kept.
        let candidates: Vec<_> = timeline.units().iter().filter(|unit| !unit.is_non_speech()).collect();
        let total = candidates.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));
        let answered = Arc::new(AtomicUsize::new(0));

        let mut verdicts: Vec<(usize, bool)> = stream::iter(candidates.into_iter().enumerate())
            .map(|(position, unit)| {
                let semaphore = semaphore.clone();
                let answered = answered.clone();
                let progress_callback = progress_callback.clone();
                let request = self.prompt.request(keywords, unit);

                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| ProviderError::RequestFailed(format!("Relevance pool closed: {}", e)))?;

                    let answer = oracle.query(&request).await?;
                    let relevant = is_affirmative(&answer);
                    debug!("Unit {} relevant: {}", unit.index, relevant);

                    let current = answered.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total);

                    Ok::<_, ProviderError>((position, relevant))
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .try_collect()
            .await?;

        // Completion order is arbitrary; restore timeline order
        verdicts.sort_by_key(|(position, _)| *position);

        let units = timeline.units().iter().filter(|unit| !unit.is_non_speech());
        let kept: Vec<usize> = units
            .zip(verdicts)
            .filter(|(_, (_, relevant))| *relevant)
            .map(|(unit, _)| unit.index)
            .collect();

        info!("{} of {} units judged relevant", kept.len(), timeline.unit_count());

        if kept.is_empty() {
            return Err(SummaryError::EmptySelection(
                "no unit was judged relevant to the audience".to_string(),
            ));
        }
        Ok(timeline.restricted_to(&kept))
    }
}
