//! Unified application error types for SchoolHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Callers distinguish failures by
//! [`ErrorKind`], never by matching on the message text.

use std::fmt;
use thiserror::Error;

/// Boxed error type used for causes that are already type-erased.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error kind categorization used across the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Zero rows where exactly one was expected.
    NotFound,
    /// Input validation failed (bad sort field, malformed filter value).
    Validation,
    /// A unique, foreign-key, not-null or check constraint rejected a write.
    ConstraintViolation,
    /// Result columns did not match the record/auxiliary schema of a query.
    ScanMismatch,
    /// No connection could be obtained from the pool.
    ConnectionUnavailable,
    /// Any other database driver error.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::ConstraintViolation => write!(f, "CONSTRAINT_VIOLATION"),
            Self::ScanMismatch => write!(f, "SCAN_MISMATCH"),
            Self::ConnectionUnavailable => write!(f, "CONNECTION_UNAVAILABLE"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout SchoolHub.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<BoxedSource>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new application error from an already boxed cause.
    pub fn with_boxed_source(kind: ErrorKind, message: impl Into<String>, source: BoxedSource) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a not-found error for a record of `entity` with the given id.
    pub fn entity_not_found(entity: &str, id: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{entity} {id} not found"))
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a constraint-violation error.
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConstraintViolation, message)
    }

    /// Create a scan-mismatch error.
    pub fn scan_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ScanMismatch, message)
    }

    /// Create a connection-unavailable error.
    pub fn connection_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionUnavailable, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Prefix the message with additional context, keeping kind and source.
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }

    /// Whether this is a [`ErrorKind::NotFound`] error.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Whether a caller may retry the failed operation with backoff.
    ///
    /// The data layer itself never retries.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::ConnectionUnavailable
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
