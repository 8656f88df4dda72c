//! Classification of driver errors into [`ErrorKind`]s.
//!
//! This is the single point where database failures are detected, so it is
//! also the single point where they are logged. Callers only add context.

use sqlx::error::ErrorKind as DbErrorKind;
use tracing::{debug, error, warn};

use schoolhub_core::error::{AppError, ErrorKind};

use crate::connection::Operation;

/// Map a sqlx error raised while running `op` to an [`AppError`].
pub fn classify(op: Operation, err: sqlx::Error) -> AppError {
    let (kind, detail) = match &err {
        sqlx::Error::RowNotFound => (ErrorKind::NotFound, "no matching row".to_string()),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => (
            ErrorKind::ConnectionUnavailable,
            format!("database unreachable: {err}"),
        ),
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_) => (
            ErrorKind::ScanMismatch,
            format!("result does not match row schema: {err}"),
        ),
        sqlx::Error::Database(db) => match db.kind() {
            DbErrorKind::UniqueViolation
            | DbErrorKind::ForeignKeyViolation
            | DbErrorKind::NotNullViolation
            | DbErrorKind::CheckViolation => (
                ErrorKind::ConstraintViolation,
                format!(
                    "constraint {} violated: {}",
                    db.constraint().unwrap_or("<unnamed>"),
                    db.message()
                ),
            ),
            _ => (ErrorKind::Database, db.message().to_string()),
        },
        _ => (ErrorKind::Database, err.to_string()),
    };

    match kind {
        ErrorKind::NotFound => debug!(entity = op.entity, operation = op.name, "No rows"),
        ErrorKind::ConstraintViolation | ErrorKind::ConnectionUnavailable => {
            warn!(entity = op.entity, operation = op.name, kind = %kind, error = %detail, "Database operation failed");
        }
        _ => {
            error!(entity = op.entity, operation = op.name, kind = %kind, error = %detail, "Database operation failed");
        }
    }

    AppError::with_source(kind, format!("{op}: {detail}"), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OP: Operation = Operation::read("Classroom", "list");

    #[test]
    fn test_row_not_found_is_typed() {
        let err = classify(OP, sqlx::Error::RowNotFound);
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.starts_with("Classroom.list"));
    }

    #[test]
    fn test_pool_errors_are_connection_unavailable() {
        assert_eq!(
            classify(OP, sqlx::Error::PoolTimedOut).kind,
            ErrorKind::ConnectionUnavailable
        );
        assert_eq!(
            classify(OP, sqlx::Error::PoolClosed).kind,
            ErrorKind::ConnectionUnavailable
        );
    }

    #[test]
    fn test_column_errors_are_scan_mismatch() {
        let err = classify(OP, sqlx::Error::ColumnNotFound("__total".into()));
        assert_eq!(err.kind, ErrorKind::ScanMismatch);
        let err = classify(OP, sqlx::Error::ColumnIndexOutOfBounds { index: 9, len: 8 });
        assert_eq!(err.kind, ErrorKind::ScanMismatch);
    }

    #[test]
    fn test_other_errors_are_database() {
        let err = classify(OP, sqlx::Error::Protocol("unexpected message".into()));
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.source.is_some());
    }
}
