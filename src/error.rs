//! Error taxonomy for the search pipeline.
//!
//! The boundary adapters (`llm`, `vector`, `records`) report failures as
//! `anyhow` chains the way they each talk to their service; at the engine
//! seam those collapse into this enum so the outer HTTP layer can map each
//! variant to a status code and a retry hint.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The request was rejected before any remote call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A remote collaborator (embedding, vector index, record store)
    /// failed. Retryable by the caller; not retried internally.
    #[error("{service} request failed: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    /// The engine has not completed initialization (or init failed).
    #[error("search engine not ready: {0}")]
    NotReady(String),

    /// The remote pipeline (embed, query, fetch) exceeded its deadline.
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
}

impl SearchError {
    /// Wrap a boundary failure, flattening the full context chain.
    pub fn service(service: &'static str, err: anyhow::Error) -> Self {
        Self::Service {
            service,
            message: format!("{err:#}"),
        }
    }

    /// Whether the caller can reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_flattens_context_chain() {
        let inner = anyhow::anyhow!("connection refused");
        let err = SearchError::service("embedding", inner.context("Failed to call embed API"));
        let msg = err.to_string();
        assert!(msg.contains("embedding request failed"));
        assert!(msg.contains("Failed to call embed API"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(SearchError::service("vector index", anyhow::anyhow!("503")).is_retryable());
        assert!(SearchError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!SearchError::InvalidInput("empty".into()).is_retryable());
        assert!(!SearchError::NotReady("uninitialized".into()).is_retryable());
    }
}
