/*!
 * Mock oracle implementation for testing.
 *
 * This module provides a deterministic oracle that simulates different behaviors:
 * - `MockOracle::consecutive()` - Summaries list the first `n` indices for a requested size `n`
 * - `MockOracle::malformed()` - Summaries contain no `(index)` lines
 * - `MockOracle::scripted(..)` - Summaries are taken from a fixed script
 * - `MockOracle::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::errors::ProviderError;
use super::{Oracle, OracleRequest, RequestKind};

/// Behavior mode for the mock oracle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Summaries return `n` consecutive indices beginning at `start`
    Consecutive { start: usize },
    /// Summaries never contain a parseable indexed line
    Malformed,
    /// Summaries are popped from a script; the last entry repeats
    Scripted,
    /// Fails every Nth request, otherwise behaves like `Consecutive { start: 0 }`
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty text
    Empty,
}

/// Deterministic oracle for tests
#[derive(Debug, Clone)]
pub struct MockOracle {
    /// Behavior mode
    behavior: MockBehavior,
    /// Keywords that make a relevance query answer "yes"; empty means always yes
    relevance_keywords: Vec<String>,
    /// Upper bound of a random per-request delay
    max_jitter_ms: u64,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request kind received, in arrival order
    requests: Arc<Mutex<Vec<RequestKind>>>,
    /// Scripted summary responses
    script: Arc<Mutex<VecDeque<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&OracleRequest) -> String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockOracle {
    /// Create a new mock oracle with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            relevance_keywords: Vec::new(),
            max_jitter_ms: 0,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            custom_response: None,
        }
    }

    /// Summaries list indices `0..n`
    pub fn consecutive() -> Self {
        Self::new(MockBehavior::Consecutive { start: 0 })
    }

    /// Summaries without any indexed line
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Summaries taken in order from `responses`
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let oracle = Self::new(MockBehavior::Scripted);
        lock(&oracle.script).extend(responses.into_iter().map(Into::into));
        oracle
    }

    /// Create an intermittently failing mock oracle
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock oracle that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty text
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Answer relevance queries with "yes" only when a keyword appears
    pub fn with_relevance_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relevance_keywords = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
        self
    }

    /// Delay each answer by a random duration up to `max_ms`
    pub fn with_jitter(mut self, max_ms: u64) -> Self {
        self.max_jitter_ms = max_ms;
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&OracleRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Requested sizes of every summary request, in order
    pub fn summary_sizes(&self) -> Vec<usize> {
        lock(&self.requests)
            .iter()
            .filter_map(|kind| match kind {
                RequestKind::Summary { target_size } => Some(*target_size),
                RequestKind::Relevance => None,
            })
            .collect()
    }

    /// Format indices as a summary in the `(index) text` reply form
    pub fn format_summary(indices: impl IntoIterator<Item = usize>) -> String {
        indices
            .into_iter()
            .map(|i| format!("({}) line {}", i, i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn answer_relevance(&self, request: &OracleRequest) -> String {
        if self.relevance_keywords.is_empty() {
            return "Yes".to_string();
        }
        let context = request.context.to_lowercase();
        if self.relevance_keywords.iter().any(|k| context.contains(k.as_str())) {
            "Yes, this is relevant.".to_string()
        } else {
            "No.".to_string()
        }
    }

    fn answer_summary(&self, target_size: usize) -> String {
        match self.behavior {
            MockBehavior::Consecutive { start } => Self::format_summary(start..start + target_size),
            MockBehavior::Intermittent { .. } => Self::format_summary(0..target_size),
            MockBehavior::Malformed => {
                "Here is a short summary of the video.\nIt talks about several topics.".to_string()
            }
            MockBehavior::Scripted => {
                let mut script = lock(&self.script);
                if script.len() > 1 {
                    script.pop_front().unwrap_or_default()
                } else {
                    script.front().cloned().unwrap_or_default()
                }
            }
            MockBehavior::Failing | MockBehavior::Empty => String::new(),
        }
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn query(&self, request: &OracleRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.kind);

        if self.max_jitter_ms > 0 {
            let delay = rand::rng().random_range(0..=self.max_jitter_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match self.behavior {
            MockBehavior::Failing => {
                return Err(ProviderError::ApiError {
                    message: "Simulated oracle failure".to_string(),
                    status_code: 500,
                });
            }
            MockBehavior::Intermittent { fail_every } if count % fail_every == fail_every - 1 => {
                return Err(ProviderError::ApiError {
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                    status_code: 503,
                });
            }
            MockBehavior::Empty => return Ok(String::new()),
            _ => {}
        }

        if let Some(generator) = self.custom_response {
            return Ok(generator(request));
        }

        Ok(match request.kind {
            RequestKind::Relevance => self.answer_relevance(request),
            RequestKind::Summary { target_size } => self.answer_summary(target_size),
        })
    }

    fn describe(&self) -> String {
        format!("Mock ({:?})", self.behavior)
    }
}
