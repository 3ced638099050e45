//! Integration Tests
//!
//! Cross-crate tests through the `tether` facade crate:
//! - Persistence: state survives a snapshot round trip through disk
//! - Workflow: operator calls through the in-process facade connection

mod persistence;
mod workflow;
