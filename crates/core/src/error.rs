//! Error types for Tether
//!
//! This module defines the error taxonomy shared by the store, the resource
//! entities and the facade server. We use `thiserror` for automatic `Display`
//! and `Error` trait implementations.
//!
//! ## Categories
//!
//! | Category | Variants | Retry |
//! |----------|----------|-------|
//! | Lookup | `NotFound`, `AlreadyExists` | no |
//! | Precondition | `TxnAborted`, `ExcessiveContention` | caller decides |
//! | Validation | `InvalidInput`, `InvalidName`, `NotValid` | no |
//! | System | `Storage`, `Serialization`, `Internal` | no |
//!
//! Errors crossing a component boundary are wrapped with
//! [`TetherError::annotate`], which keeps the original error as the source.
//! Classification helpers (`is_not_found`, `is_txn_aborted`) look through
//! every annotation layer.

use thiserror::Error;

/// Result type alias for Tether operations
pub type TetherResult<T> = std::result::Result<T, TetherError>;

/// Error types for Tether
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TetherError {
    /// Entity or document does not exist
    #[error("{entity} not found")]
    NotFound {
        /// Human-readable entity description
        entity: String,
    },

    /// Entity or document already exists
    #[error("{entity} already exists")]
    AlreadyExists {
        /// Human-readable entity description
        entity: String,
    },

    /// A transaction precondition did not hold; nothing was written
    #[error("transaction aborted")]
    TxnAborted,

    /// A retrying runner gave up after repeated precondition failures
    #[error("state changing too quickly; try again soon ({attempts} attempts)")]
    ExcessiveContention {
        /// Number of attempts made
        attempts: usize,
    },

    /// A transaction builder had nothing to do
    #[error("no transaction operations")]
    NoOperations,

    /// Invalid argument
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Why the input was rejected
        reason: String,
    },

    /// Invalid entity name or tag
    #[error("invalid {kind} name {name:?}")]
    InvalidName {
        /// Kind of name ("unit", "service", "action", ...)
        kind: &'static str,
        /// The rejected name
        name: String,
    },

    /// Operation is not valid for the entity's current state
    #[error("{reason}")]
    NotValid {
        /// What made the operation invalid
        reason: String,
    },

    /// Storage layer error
    #[error("storage error: {message}")]
    Storage {
        /// Error message
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {reason}")]
    Serialization {
        /// Error message
        reason: String,
    },

    /// Internal error (bug or invariant violation)
    #[error("internal error: {reason}")]
    Internal {
        /// Error message
        reason: String,
    },

    /// An error annotated with the operation that produced it
    #[error("{context}: {source}")]
    Annotated {
        /// Operation context, e.g. `cannot remove IP address 10.0.0.1`
        context: String,
        /// The wrapped error
        #[source]
        source: Box<TetherError>,
    },
}

impl TetherError {
    /// Create a NotFound error
    pub fn not_found(entity: impl Into<String>) -> Self {
        TetherError::NotFound {
            entity: entity.into(),
        }
    }

    /// Create an AlreadyExists error
    pub fn already_exists(entity: impl Into<String>) -> Self {
        TetherError::AlreadyExists {
            entity: entity.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        TetherError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a NotValid error
    pub fn not_valid(reason: impl Into<String>) -> Self {
        TetherError::NotValid {
            reason: reason.into(),
        }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        TetherError::Storage {
            message: message.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        TetherError::Internal {
            reason: reason.into(),
        }
    }

    /// Wrap this error with operation context
    pub fn annotate(self, context: impl Into<String>) -> Self {
        TetherError::Annotated {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all annotations stripped
    pub fn cause(&self) -> &TetherError {
        let mut err = self;
        while let TetherError::Annotated { source, .. } = err {
            err = source;
        }
        err
    }

    /// True if the underlying cause is `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self.cause(), TetherError::NotFound { .. })
    }

    /// True if the underlying cause is `AlreadyExists`
    pub fn is_already_exists(&self) -> bool {
        matches!(self.cause(), TetherError::AlreadyExists { .. })
    }

    /// True if the underlying cause is a failed transaction precondition
    pub fn is_txn_aborted(&self) -> bool {
        matches!(self.cause(), TetherError::TxnAborted)
    }
}

impl From<serde_json::Error> for TetherError {
    fn from(e: serde_json::Error) -> Self {
        TetherError::Serialization {
            reason: e.to_string(),
        }
    }
}

/// Extension for annotating the error side of a result
pub trait ResultExt<T> {
    /// Annotate the error, if any, with the context produced by `f`
    fn annotate_with<F, C>(self, f: F) -> TetherResult<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> ResultExt<T> for TetherResult<T> {
    fn annotate_with<F, C>(self, f: F) -> TetherResult<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| e.annotate(f()))
    }
}
