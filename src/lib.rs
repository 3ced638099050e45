//! Tether - control-plane core for cluster orchestration
//!
//! Tether tracks the lifecycle state of cluster resources (network
//! addresses, services, units, queued actions) in a shared document store,
//! and exposes that state to operator clients through typed facades.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tether::{api, apiserver, state::State, storage::DocumentStore};
//!
//! let st = State::new(DocumentStore::new(), uuid::Uuid::new_v4());
//! st.add_service("mysql")?.add_unit()?;
//!
//! let dispatcher = apiserver::Dispatcher::new(st.clone(), apiserver::Authorizer::client("user-admin"));
//! let conn = Arc::new(apiserver::InProcessConnection::new(dispatcher));
//! api::service::Client::new(conn).set_metric_credentials("mysql", b"creds")?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! tether-cli ──► tether-api ──► tether-apiserver ──► tether-state
//!                                                       │
//!                         tether-concurrency ◄──────────┘
//!                                │
//!                         tether-storage ──► tether-core
//! ```

pub use tether_api as api;
pub use tether_apiserver as apiserver;
pub use tether_concurrency as concurrency;
pub use tether_core as types;
pub use tether_state as state;
pub use tether_storage as storage;

pub use tether_core::{TetherError, TetherResult, Value};
pub use tether_state::{State, TetherConfig};
