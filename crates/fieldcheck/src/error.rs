//! Error types for fieldcheck.
//!
//! Validation failures are not errors: they are reported as data through
//! [`Rendered`](crate::Rendered). The types here cover the two real faults,
//! a bad validator configuration and a predicate that failed to run.

use thiserror::Error;

/// Boxed error returned by fallible predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for evaluation and validation.
pub type Result<T, E = ExecutionFault> = std::result::Result<T, E>;

/// Error raised while constructing a [`Validator`](crate::Validator).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `errorsReturnedAs` named an output mode that does not exist.
    #[error("Unknown return-type \"{value}\", expected one of: {expected}")]
    UnknownReturnType {
        /// The normalized value that was supplied
        value: String,
        /// Comma separated list of the accepted modes
        expected: String,
    },
}

/// A predicate failed while a field was being evaluated.
///
/// Faults abort the batch they occur in and are never mixed into the
/// violation list.
#[derive(Debug, Error)]
pub enum ExecutionFault {
    /// The predicate configured for `field` returned an error.
    #[error("validator for field '{field}' failed: {source}")]
    Predicate {
        field: String,
        #[source]
        source: BoxError,
    },

    /// A deferred work item was cancelled before it produced a result,
    /// typically because the runtime is shutting down.
    #[error("deferred validation was cancelled: {0}")]
    Cancelled(#[from] tokio::task::JoinError),
}

impl ExecutionFault {
    /// Create a predicate fault for a field.
    pub fn predicate(field: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Predicate {
            field: field.into(),
            source: source.into(),
        }
    }

    /// The field whose predicate failed, if the fault came from a predicate.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Predicate { field, .. } => Some(field),
            Self::Cancelled(_) => None,
        }
    }
}
