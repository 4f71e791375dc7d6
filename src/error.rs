//! Error types for authorfold operations.
//!
//! Provides rich error context for library consumers. Recoverable input
//! problems (malformed corpus lines, vocabulary underflow) never surface
//! here: they are logged and counted where they happen. Everything in this
//! enum is something the caller has to decide about.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for authorfold operations.
///
/// # Examples
///
/// ```
/// use authorfold::error::AuthorfoldError;
///
/// let err = AuthorfoldError::DimensionMismatch {
///     expected: "3 columns".to_string(),
///     actual: "2 columns".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug, Error)]
pub enum AuthorfoldError {
    /// Matrix/vector dimensions don't match for the operation.
    #[error("Matrix dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter or configuration value.
    #[error("Invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// An operation received no data to work on.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A fold could not be trained meaningfully.
    #[error("degenerate fold for document {doc_id}: {reason}")]
    DegenerateFold {
        /// Identifier of the held-out document
        doc_id: String,
        /// Why the fold is unusable
        reason: String,
    },

    /// Linear system could not be solved (matrix not positive definite).
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    /// A fold task panicked on a worker thread.
    #[error("fold task {index} panicked: {message}")]
    TaskPanicked {
        /// Index of the document whose fold panicked
        index: usize,
        /// Panic payload, when it was a string
        message: String,
    },

    /// The run was cancelled before every fold completed.
    #[error("run cancelled after {completed} of {total} folds")]
    Cancelled {
        /// Folds finished before cancellation was observed
        completed: usize,
        /// Folds requested
        total: usize,
    },

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A file could not be parsed at all (as opposed to a skipped line).
    #[error("parse error in {}:{line}: {message}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with string message.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for AuthorfoldError {
    fn from(msg: &str) -> Self {
        AuthorfoldError::Other(msg.to_string())
    }
}

impl From<String> for AuthorfoldError {
    fn from(msg: String) -> Self {
        AuthorfoldError::Other(msg)
    }
}

impl From<toml::de::Error> for AuthorfoldError {
    fn from(err: toml::de::Error) -> Self {
        AuthorfoldError::Config(err.to_string())
    }
}

impl AuthorfoldError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an empty input error
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::EmptyInput(context.to_string())
    }

    /// Create an invalid hyperparameter error
    #[must_use]
    pub fn invalid_param(param: &str, value: impl ToString, constraint: &str) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, AuthorfoldError>;
