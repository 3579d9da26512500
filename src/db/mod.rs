pub mod connection;
#[cfg(test)]
pub mod memory;

use crate::shared::error::RepositoryError;

/// Turns a unique-constraint violation into `Conflict(message)`; anything
/// else stays a database error.
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(message.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}
