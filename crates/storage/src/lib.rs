//! Storage layer for Tether
//!
//! This crate implements the shared document store:
//! - DocumentStore: collection-ordered documents behind a `parking_lot::RwLock`
//! - WriteView: staged all-or-nothing writes
//! - Store-wide revision counter with `AtomicU64`
//! - JSON snapshot files for persistence between process runs

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod persist;
pub mod store;

pub use document::{doc_from, DocKey, Document, StoredDoc};
pub use store::{DocumentStore, WriteView};
