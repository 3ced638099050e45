//! Command errors.
//!
//! Every failure a command can report. The binary prints the message to
//! stderr and exits with status 1.

use std::path::Path;

use tether_core::TetherError;
use thiserror::Error;

use crate::conform::ConformError;

/// Failure of a `tether` command
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad command-line arguments
    #[error("{0}")]
    Usage(String),

    /// Parameter or credential file could not be read
    #[error("cannot read {path}: {reason}")]
    ReadFile { path: String, reason: String },

    /// Parameter file is not YAML
    #[error("cannot parse params file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Parameter tree has keys that cannot become strings
    #[error(transparent)]
    Conform(#[from] ConformError),

    /// Parameter root is not a mapping
    #[error("params must contain a YAML map with string keys")]
    ParamsNotMap,

    /// Facade call failed
    #[error(transparent)]
    Api(#[from] tether_api::Error),

    /// Local state operation failed
    #[error(transparent)]
    State(#[from] TetherError),

    /// Output could not be rendered or written
    #[error("cannot write output: {0}")]
    Output(String),
}

impl CommandError {
    /// Usage error with a message
    pub fn usage(message: impl Into<String>) -> Self {
        CommandError::Usage(message.into())
    }

    /// Response that broke the facade protocol
    pub fn protocol(reason: &str) -> Self {
        CommandError::Api(tether_api::Error::protocol(reason))
    }

    /// Output error from any displayable cause
    pub fn output(cause: impl std::fmt::Display) -> Self {
        CommandError::Output(cause.to_string())
    }

    /// File read error
    pub fn read_file(path: &Path, cause: impl std::fmt::Display) -> Self {
        CommandError::ReadFile {
            path: path.display().to_string(),
            reason: cause.to_string(),
        }
    }
}

/// Reject leftover positional arguments.
pub fn check_empty(args: &[String]) -> Result<(), CommandError> {
    if args.is_empty() {
        return Ok(());
    }
    Err(CommandError::usage(format!("unrecognized args: {:?}", args)))
}
