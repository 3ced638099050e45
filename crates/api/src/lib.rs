//! Client API for Tether facades
//!
//! A facade is a named, versioned group of remote operations. Every call is
//! one request/response pair over an [`ApiCaller`], synchronous from the
//! caller's point of view.
//!
//! ## Module Structure
//!
//! - `caller`: the transport seam and [`FacadeCaller`]
//! - `params`: request/response types and batched-result helpers
//! - `service`: `Service` facade client
//! - `action`: `Action` facade client
//!
//! ## Quick Start
//!
//! ```ignore
//! use tether_api::service;
//!
//! let client = service::Client::new(connection);
//! client.set_metric_credentials("mysql", b"creds")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod caller;
pub mod error;
pub mod params;
pub mod service;

pub use caller::{ApiCaller, FacadeCallFn, FacadeCaller};
pub use error::{ApiError, Error, Result};
