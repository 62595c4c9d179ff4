// sqlx::Error -> AppError mapping

use jobledger_core::error::AppError;

/// Convert sqlx::Error to AppError.
///
/// Busy/locked databases and pool or I/O trouble become
/// `AppError::Unavailable`; everything else is `AppError::Database`.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            match db_err.code().as_deref() {
                // SQLite result codes: https://www.sqlite.org/rescode.html
                Some("5") | Some("517") => {
                    AppError::Unavailable(format!("Database busy (SQLITE_BUSY): {}", message))
                }
                Some("6") | Some("262") => {
                    AppError::Unavailable(format!("Database locked (SQLITE_LOCKED): {}", message))
                }
                Some("13") => AppError::Database(format!("Database full: {}", message)),
                Some("787") | Some("3850") => AppError::Database(format!(
                    "Foreign key constraint violation: {}",
                    message
                )),
                Some("2067") | Some("1555") => {
                    AppError::Database(format!("Unique constraint violation: {}", message))
                }
                Some(code) => AppError::Database(format!("Database error [{}]: {}", code, message)),
                None => AppError::Database(format!("Database error: {}", message)),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            AppError::Unavailable(format!("Connection pool: {}", err))
        }
        sqlx::Error::Io(e) => AppError::Unavailable(format!("I/O error: {}", e)),
        sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => AppError::Database(err.to_string()),
    }
}
