//! Resource state for Tether
//!
//! This crate binds entity handles to documents in the shared store:
//! - State: environment-scoped entry point owning the transaction runner
//! - IpAddress: the address lifecycle state machine
//! - Service / Unit: deployed workloads and their numbered instances
//! - Action: queued operations addressed to a unit
//! - TetherConfig: `tether.toml`
//!
//! Every mutation is a guarded transaction. Handles are snapshots: they
//! never hold a lock or lease, and a mutation that loses a race fails with
//! `TxnAborted` instead of overwriting the winner.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actions;
pub mod config;
mod docs;
pub mod ipaddresses;
pub mod services;
pub mod state;
pub mod units;

pub use actions::{Action, ActionStatus};
pub use config::{ApiConfig, TetherConfig, CONFIG_FILE_NAME, SNAPSHOT_FILE_NAME};
pub use ipaddresses::{Address, AddressState, AddressType, IpAddress, Scope};
pub use services::{Life, Service};
pub use state::State;
pub use units::Unit;
