//! Error types shared by the planner, the providers and the algorithms.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PlannerError {
    /// Missing or nonsensical configuration; raised before anything is built.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("at least {required} points of interest are required, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },
    /// The matrix provider failed or returned malformed data.
    #[error("upstream matrix error: {0}")]
    UpstreamMatrix(String),
    #[error("{algorithm} refuses {nodes} nodes (limit is {limit})")]
    ComplexityLimitExceeded {
        algorithm: String,
        nodes: usize,
        limit: usize,
    },
    #[error("search cancelled")]
    Cancelled,
    #[error("search deadline exceeded after {elapsed_ms} ms")]
    DeadlineExceeded { elapsed_ms: u128 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamMatrix(message.into())
    }

    pub fn complexity(algorithm: &str, nodes: usize, limit: usize) -> Self {
        Self::ComplexityLimitExceeded {
            algorithm: algorithm.to_string(),
            nodes,
            limit,
        }
    }

    /// Validation and configuration problems are the caller's to fix.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Validation(_) | Self::InsufficientPoints { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PlannerError::complexity("HeldKarp", 25, 16);
        assert_eq!(err.to_string(), "HeldKarp refuses 25 nodes (limit is 16)");

        let err = PlannerError::InsufficientPoints { required: 2, actual: 1 };
        assert!(err.is_caller_error());
        assert!(!PlannerError::upstream("timeout").is_caller_error());
    }
}
