//! # Store Errors
//!
//! ```text
//!   sqlx::Error ──┐
//!                 ├──► DbError ──► ApiError (status + envelope)
//!   CoreError  ───┘
//! ```
//!
//! Repositories check lifecycle rules inside their transaction, so a rule
//! violation surfaces here as [`DbError::Rule`] and keeps its original
//! class all the way to the HTTP status.

use cafe_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// ## When This Occurs
    /// - Unknown order id, item id, username or menu item
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// ## When This Occurs
    /// - Creating a user whose username is taken
    /// - Same item id twice in one order
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A row references a parent that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Compare-and-set lost: the row changed after it was read.
    ///
    /// ## When This Occurs
    /// - Two dashboards move the same order at once
    /// - A kitchen toggle races a waiter serve on the same item
    #[error("{entity} {id} was modified concurrently (expected {expected}, found {actual})")]
    Conflict {
        entity: String,
        id: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Rule(#[from] CoreError),

    /// The write lock was not released within the busy timeout, or no
    /// pooled connection became free in time.
    #[error("Database busy, try again")]
    Busy,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Anything else SQLite or sqlx reported.
    #[error("Database error: {0}")]
    Sqlite(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// A lost compare-and-set on `entity` `id`.
    pub fn conflict(
        entity: impl Into<String>,
        id: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// ```text
/// RowNotFound                          → NotFound
/// "UNIQUE constraint failed: t.col"    → UniqueViolation { field: "t.col" }
/// "FOREIGN KEY constraint failed"      → ForeignKeyViolation
/// "database is locked" / PoolTimedOut  → Busy
/// PoolClosed                           → ConnectionFailed
/// anything else                        → Sqlite
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::duplicate(field, "unknown")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked") {
                    DbError::Busy
                } else {
                    DbError::Sqlite(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Sqlite(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::OrderStatus;

    #[test]
    fn test_conflict_message() {
        let err = DbError::conflict("Order", "ORD-1", OrderStatus::Ready, OrderStatus::Served);
        assert_eq!(
            err.to_string(),
            "Order ORD-1 was modified concurrently (expected READY, found SERVED)"
        );
    }

    #[test]
    fn test_rule_error_is_transparent() {
        let err: DbError = CoreError::EmptyOrder.into();
        assert_eq!(err.to_string(), "Order must contain at least one item");
    }

    #[test]
    fn test_pool_timeout_is_busy() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::Busy));
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
    }
}
