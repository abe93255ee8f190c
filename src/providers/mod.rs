/*!
 * Oracle implementations for relevance judgments and summaries.
 *
 * This module contains the oracle capability and its backends:
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic API integration
 * - Extractive: Offline KL-sum summarizer, no server needed
 * - Retry: Backoff decorator around any backend
 * - Mock: Deterministic stub used by tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::ProviderError;

/// What an oracle request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Yes/no judgment on one unit's text
    Relevance,
    /// Pruned, reorderable summary of the indexed corpus
    Summary {
        /// Number of lines the summary should contain
        target_size: usize,
    },
}

/// A natural-language instruction plus the text it applies to
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub kind: RequestKind,
    pub instruction: String,
    pub context: String,
}

impl OracleRequest {
    pub fn relevance(instruction: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Relevance,
            instruction: instruction.into(),
            context: context.into(),
        }
    }

    pub fn summary(target_size: usize, instruction: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Summary { target_size },
            instruction: instruction.into(),
            context: context.into(),
        }
    }

    /// Single prompt string for completion-style backends
    pub fn to_prompt(&self) -> String {
        format!("{}\n\n{}", self.instruction, self.context)
    }
}

/// Common trait for all oracle backends
///
/// This trait defines the interface that all backends must follow,
/// allowing them to be used interchangeably by the relevance filter
/// and the duration converger.
#[async_trait]
pub trait Oracle: Send + Sync + Debug {
    /// Answer a request with free text
    ///
    /// # Arguments
    /// * `request` - The instruction and its context
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The raw completion or a transport/API error
    async fn query(&self, request: &OracleRequest) -> Result<String, ProviderError>;

    /// Test the connection to the backend
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn query(&self, request: &OracleRequest) -> Result<String, ProviderError> {
        (**self).query(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        (**self).test_connection().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Map a reqwest failure onto the provider taxonomy
pub(crate) fn classify_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Map a non-success HTTP status onto the provider taxonomy
pub(crate) fn classify_status(status_code: u16, message: String) -> ProviderError {
    match status_code {
        401 | 403 => ProviderError::AuthenticationError(message),
        _ => ProviderError::ApiError { status_code, message },
    }
}

pub mod ollama;
pub mod anthropic;
pub mod extractive;
pub mod retry;
pub mod mock;
