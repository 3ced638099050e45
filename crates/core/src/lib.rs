//! Core types for Tether
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: canonical value tree for document fields and action parameters
//! - TetherError: error taxonomy shared by every layer
//! - Names and tags: unit/service/machine/action identifiers and validation
//! - Paths: per-platform well-known locations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod names;
pub mod paths;
pub mod value;

pub use error::{ResultExt, TetherError, TetherResult};
pub use names::{ActionName, ActionTag, MachineTag, ServiceTag, Tag, UnitTag};
pub use value::Value;
