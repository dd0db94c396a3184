// sqlx error mapping

use branchguard_core::error::AppError;

/// Convert sqlx::Error to AppError with structured information
///
/// Every storage error is a `Database` error: retryable, never a branch failure.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite result codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "5" | "517" => {
                    AppError::Database(format!("Database locked (SQLITE_BUSY): {}", db_err.message()))
                }
                "6" | "262" => {
                    AppError::Database(format!("Table locked (SQLITE_LOCKED): {}", db_err.message()))
                }
                "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                "2067" | "1555" => AppError::Database(format!(
                    "Unique constraint violation: {}",
                    db_err.message()
                )),
                "275" => AppError::Database(format!("Check constraint failed: {}", db_err.message())),
                other => AppError::Database(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            },
            None => AppError::Database(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::PoolTimedOut => AppError::Database("Connection pool timed out".to_string()),
        sqlx::Error::PoolClosed => AppError::Database("Connection pool closed".to_string()),
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {}", col)),
        _ => AppError::Database(err.to_string()),
    }
}
