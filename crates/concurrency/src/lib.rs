//! Concurrency layer for Tether
//!
//! This crate implements optimistic concurrency control (OCC) over the
//! document store:
//! - Op: one guarded insert, update, remove or pure assertion
//! - Assert: preconditions checked at commit time
//! - TxnRunner: atomic multi-document commit, plus a retrying runner that
//!   rebuilds ops from fresh reads after a conflict
//!
//! Nothing here holds a lock between a read and the commit that depends on
//! it. Conflicts surface as `TetherError::TxnAborted`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod op;
pub mod retry;
pub mod runner;
pub mod validation;

pub use op::{Assert, Op, OpKind, Update};
pub use retry::RetryConfig;
pub use runner::{BeforeHook, TxnRunner};
pub use validation::{validate_op, ConflictType};
