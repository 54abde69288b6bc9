use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the matching engine
///
/// Batch-level problems (bad input, bad configuration) abort a request before
/// any scoring runs. Per-pair signal failures never reach this type; they are
/// recorded as unavailable signals instead.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Matching timed out after {0:?}")]
    Timeout(Duration),

    #[error("Matching was cancelled")]
    Cancelled,

    #[error("Scoring worker failed: {0}")]
    Worker(String),
}

impl From<validator::ValidationErrors> for MatchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MatchError::Input(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MatchError::Config("unknown signal 'citations'".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: unknown signal 'citations'");

        let err = MatchError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }
}
