//! Conversion from state errors to wire errors.

use tether_api::error::{
    CODE_ALREADY_EXISTS, CODE_EXCESSIVE_CONTENTION, CODE_NOT_FOUND, CODE_TXN_ABORTED,
};
use tether_api::ApiError;
use tether_core::TetherError;

/// Convert a state error to the error put on the wire.
///
/// The code is chosen from the innermost error kind; the message is the
/// innermost error's message, without operation context.
pub fn server_error(err: &TetherError) -> ApiError {
    let cause = err.cause();
    let code = match cause {
        TetherError::NotFound { .. } => CODE_NOT_FOUND,
        TetherError::AlreadyExists { .. } => CODE_ALREADY_EXISTS,
        TetherError::ExcessiveContention { .. } => CODE_EXCESSIVE_CONTENTION,
        TetherError::TxnAborted => CODE_TXN_ABORTED,
        _ => "",
    };
    ApiError::new(cause.to_string(), code)
}
