//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error objects. Every error carries a
//! `result` marker in its data so the coordinator can tell a business rollback
//! request from a transient failure without parsing messages.

use branchguard_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;
use serde::Serialize;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const BRANCH_FAILURE: i32 = 4009;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
    pub const SYSTEM_ERROR: i32 = 5002;
    pub const TIMEOUT: i32 = 5003;
}

/// Branch result markers understood by the coordinator
pub mod result {
    /// Business failure: compensate the saga
    pub const FAILURE: &str = "FAILURE";
    /// Transient failure: retry the same branch
    pub const ONGOING: &str = "ONGOING";
}

#[derive(Debug, Clone, Serialize)]
struct ErrorData {
    result: &'static str,
}

fn owned(code: i32, message: String, marker: &'static str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code, message, Some(ErrorData { result: marker }))
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let message = err.to_string();
    match err {
        AppError::BranchFailure(_) => owned(code::BRANCH_FAILURE, message, result::FAILURE),
        AppError::Database(_) => owned(code::DB_ERROR, message, result::ONGOING),
        AppError::Timeout(_) => owned(code::TIMEOUT, message, result::ONGOING),
        AppError::Io(_) => owned(code::SYSTEM_ERROR, message, result::ONGOING),
        AppError::Validation(_) | AppError::Domain(_) | AppError::Serialization(_) => {
            owned(code::VALIDATION_ERROR, message, result::FAILURE)
        }
        AppError::NotFound(_) => owned(code::NOT_FOUND, message, result::FAILURE),
        AppError::Config(_) | AppError::Internal(_) => {
            owned(code::INTERNAL_ERROR, message, result::ONGOING)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(err: &ErrorObjectOwned) -> String {
        let data: serde_json::Value = serde_json::from_str(err.data().unwrap().get()).unwrap();
        data["result"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_branch_failure_requests_rollback() {
        let err = to_rpc_error(AppError::BranchFailure("insufficient stock".into()));
        assert_eq!(err.code(), code::BRANCH_FAILURE);
        assert_eq!(marker(&err), result::FAILURE);
        assert!(err.message().contains("insufficient stock"));
    }

    #[test]
    fn test_infrastructure_failure_requests_retry() {
        let err = to_rpc_error(AppError::Database("database is locked".into()));
        assert_eq!(err.code(), code::DB_ERROR);
        assert_eq!(marker(&err), result::ONGOING);

        let err = to_rpc_error(AppError::Timeout("branch".into()));
        assert_eq!(err.code(), code::TIMEOUT);
        assert_eq!(marker(&err), result::ONGOING);
    }
}
