//! Mapping of sqlx errors into the domain taxonomy.
//!
//! | sqlx error                                   | SQLite code        | DomainError   |
//! |----------------------------------------------|--------------------|---------------|
//! | Database (unique violation)                  | 2067 / 1555        | `DuplicateKey`|
//! | Database (foreign key violation)             | 787                | `Referenced`  |
//! | Database (busy / locked)                     | 5, 6 and extended  | `Busy`        |
//! | PoolTimedOut                                 | n/a                | `Busy`        |
//! | anything else                                | any                | `Storage`     |
//!
//! Engine messages only reach `Storage`, which the HTTP layer never echoes back.

use stockledger_core::DomainError;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                return DomainError::duplicate_key(format!("{operation}: key already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return DomainError::referenced(format!(
                    "{operation}: row is referenced by inventory or movement history"
                ));
            }
            if is_lock_contention(db_err.code().as_deref()) {
                return DomainError::busy(format!("{operation}: database is locked, retry"));
            }
            tracing::error!(operation, error = %db_err, "database error");
            DomainError::storage(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolTimedOut => {
            DomainError::busy(format!("{operation}: timed out waiting for a connection"))
        }
        other => {
            tracing::error!(operation, error = %other, "sqlx error");
            DomainError::storage(format!("sqlx error in {operation}: {other}"))
        }
    }
}

/// Primary result code is the low byte of SQLite's extended code.
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .map(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}
