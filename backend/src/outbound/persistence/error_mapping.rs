//! Shared Diesel error mapping for the repository adapters.
//!
//! Each repository owns its port error type, so the helpers here take the
//! variant constructors as closures and classify the Diesel failure once.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Coarse classification of a Diesel failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection,
    /// A unique or primary-key constraint rejected the write.
    UniqueViolation(String),
    /// A foreign-key constraint rejected the write.
    ForeignKeyViolation(String),
    /// Anything else.
    Query(&'static str),
}

/// Classify a Diesel error and emit debug context for it.
pub(crate) fn classify(error: &DieselError) -> DieselFailure {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation(
                info.constraint_name()
                    .unwrap_or("unique constraint")
                    .to_owned(),
            )
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DieselFailure::ForeignKeyViolation(
                info.constraint_name()
                    .unwrap_or("foreign key constraint")
                    .to_owned(),
            )
        }
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        _ => DieselFailure::Query("database error"),
    }
}

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors for repositories without constraint-specific variants.
pub(crate) fn map_basic_diesel_error<E, Q, C>(error: &DieselError, query: Q, connection: C) -> E
where
    Q: FnOnce(String) -> E,
    C: FnOnce(String) -> E,
{
    match classify(error) {
        DieselFailure::Connection => connection("database connection error".to_owned()),
        DieselFailure::UniqueViolation(constraint) => {
            query(format!("unique violation on {constraint}"))
        }
        DieselFailure::ForeignKeyViolation(constraint) => {
            query(format!("foreign key violation on {constraint}"))
        }
        DieselFailure::Query(message) => query(message.to_owned()),
    }
}
