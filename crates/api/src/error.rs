//! Error types for facade calls.
//!
//! Two layers:
//! - [`ApiError`]: the structured error a server puts on the wire, with a
//!   stable `code` clients can match on
//! - [`Error`]: everything a client call can fail with, wrapping `ApiError`
//!   for remote failures
//!
//! # Categories
//!
//! | Category | Variants | Description |
//! |----------|----------|-------------|
//! | Transport | `Transport` | Call never produced a response |
//! | Remote | `Server` | Server returned a structured error |
//! | Protocol | `Decode`, `CountMismatch`, `Protocol` | Response did not have the expected shape |

use serde::{Deserialize, Serialize};

/// Wire code for a missing entity
pub const CODE_NOT_FOUND: &str = "not found";
/// Wire code for a denied call or entity
pub const CODE_UNAUTHORIZED: &str = "unauthorized access";
/// Wire code for a duplicate entity
pub const CODE_ALREADY_EXISTS: &str = "already exists";
/// Wire code for retries exhausted by concurrent writers
pub const CODE_EXCESSIVE_CONTENTION: &str = "excessive contention";
/// Wire code for a failed precondition
pub const CODE_TXN_ABORTED: &str = "transaction aborted";
/// Wire code for an unknown facade, version or request
pub const CODE_NOT_IMPLEMENTED: &str = "not implemented";

/// Structured error carried in facade responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable message, shown to users verbatim
    pub message: String,
    /// Stable error code; empty when the error has no specific kind
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
}

impl ApiError {
    /// Error with a message and code
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    /// Error with no code
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(message, "")
    }

    /// The canonical permission error
    pub fn perm() -> Self {
        Self::new("permission denied", CODE_UNAUTHORIZED)
    }

    /// True if the code is `not found`
    pub fn is_not_found(&self) -> bool {
        self.code == CODE_NOT_FOUND
    }

    /// True if the code is `unauthorized access`
    pub fn is_unauthorized(&self) -> bool {
        self.code == CODE_UNAUTHORIZED
    }
}

/// Facade call errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The call did not complete; its effect on the server is unknown
    #[error("{op}: {reason}")]
    Transport {
        /// `Facade.Request` being called
        op: String,
        /// What went wrong
        reason: String,
    },

    /// The server returned a structured error
    #[error(transparent)]
    Server(#[from] ApiError),

    /// The response did not decode into the expected type
    #[error("cannot decode {op} response: {reason}")]
    Decode {
        /// `Facade.Request` being called
        op: String,
        /// Decoder message
        reason: String,
    },

    /// A batched response had the wrong number of results
    #[error("expected {expected} result(s), got {actual}")]
    CountMismatch {
        /// Results requested
        expected: usize,
        /// Results returned
        actual: usize,
    },

    /// The response violated the protocol in some other way
    #[error("{reason}")]
    Protocol {
        /// What was wrong
        reason: String,
    },
}

impl Error {
    /// Protocol error with a message
    pub fn protocol(reason: impl Into<String>) -> Self {
        Error::Protocol {
            reason: reason.into(),
        }
    }

    /// The server error code, if this is a server error
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Server(e) => Some(e.code.as_str()),
            _ => None,
        }
    }

    /// True for a server `not found`
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(CODE_NOT_FOUND)
    }

    /// True for a server `unauthorized access`
    pub fn is_unauthorized(&self) -> bool {
        self.code() == Some(CODE_UNAUTHORIZED)
    }
}

/// Result type for facade calls
pub type Result<T> = std::result::Result<T, Error>;
