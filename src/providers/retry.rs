/*!
 * Retry decorator for oracle backends.
 *
 * The selection pipeline never retries on its own; a caller that wants
 * resilience wraps its backend in `RetryingOracle`.
 */

use async_trait::async_trait;
use std::time::Duration;
use log::warn;

use crate::errors::ProviderError;
use super::{Oracle, OracleRequest};

/// Oracle wrapper that retries transient failures with exponential backoff
#[derive(Debug)]
pub struct RetryingOracle<O> {
    inner: O,
    /// Additional attempts after the first one
    max_retries: u32,
    /// Base backoff, doubled on each retry
    backoff_base_ms: u64,
}

impl<O: Oracle> RetryingOracle<O> {
    pub fn new(inner: O, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            backoff_base_ms,
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Whether an error is worth another attempt
    pub fn is_transient(error: &ProviderError) -> bool {
        match error {
            ProviderError::ConnectionError(_) | ProviderError::RequestFailed(_) => true,
            ProviderError::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            ProviderError::ParseError(_) | ProviderError::AuthenticationError(_) => false,
        }
    }
}

#[async_trait]
impl<O: Oracle> Oracle for RetryingOracle<O> {
    async fn query(&self, request: &OracleRequest) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.query(request).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_retries && Self::is_transient(&e) => {
                    attempt += 1;
                    let backoff_ms = self.backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
                    warn!(
                        "Oracle request failed ({}), retrying in {}ms - attempt {}/{}",
                        e, backoff_ms, attempt + 1, self.max_retries + 1
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.inner.test_connection().await
    }

    fn describe(&self) -> String {
        if self.max_retries == 0 {
            self.inner.describe()
        } else {
            format!("{} (up to {} retries)", self.inner.describe(), self.max_retries)
        }
    }
}
