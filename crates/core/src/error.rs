// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Barrier outcomes such as duplicate delivery or null compensation are not
/// errors; they are reported through `BarrierOutcome`. Everything here is a
/// real failure, split into two families the coordinator treats differently:
/// branch failures (compensate the saga) and retryable infrastructure failures.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// The branch's business logic refused the operation; the local
    /// transaction was rolled back and the saga should compensate.
    #[error("Branch failure: {0}")]
    BranchFailure(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the coordinator may retry the same branch call as-is.
    ///
    /// Storage and deadline failures never leave a ledger row behind, so a
    /// retry is indistinguishable from a first attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Timeout(_) | AppError::Io(_)
        )
    }

    /// Whether this error asks the coordinator to roll the saga back.
    pub fn is_branch_failure(&self) -> bool {
        matches!(self, AppError::BranchFailure(_))
    }

    /// Collapse a callback error into a branch failure, keeping its text.
    /// Retryable errors pass through unchanged: an outage inside the branch
    /// is retried, not compensated.
    pub fn into_branch_failure(self) -> AppError {
        match self {
            err if err.is_retryable() => err,
            AppError::BranchFailure(msg) => AppError::BranchFailure(msg),
            AppError::Domain(e) => AppError::BranchFailure(e.to_string()),
            AppError::NotFound(msg) => AppError::BranchFailure(format!("{} not found", msg)),
            other => AppError::BranchFailure(other.to_string()),
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// sqlx::Error conversion is handled in infra-sqlite
// by converting to AppError::Database(String)

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Database("locked".into()).is_retryable());
        assert!(AppError::Timeout("branch".into()).is_retryable());
        assert!(!AppError::BranchFailure("no stock".into()).is_retryable());
        assert!(!AppError::Validation("gid".into()).is_retryable());
    }

    #[test]
    fn test_into_branch_failure_keeps_reason() {
        let err = AppError::Domain(DomainError::InsufficientStock {
            product_id: 7,
            available: 1,
            requested: 3,
        })
        .into_branch_failure();

        assert!(err.is_branch_failure());
        assert!(err.to_string().contains("Insufficient stock"));

        let err = AppError::NotFound("product 7".into()).into_branch_failure();
        assert_eq!(err.to_string(), "Branch failure: product 7 not found");
    }

    #[test]
    fn test_into_branch_failure_keeps_retryable_errors() {
        let err = AppError::Timeout("user lookup for 1".into()).into_branch_failure();
        assert!(matches!(err, AppError::Timeout(_)));

        let err = AppError::Database("database is locked".into()).into_branch_failure();
        assert!(err.is_retryable());
        assert!(!err.is_branch_failure());

        let err = AppError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "user service unreachable",
        ))
        .into_branch_failure();
        assert!(err.is_retryable());
    }
}
