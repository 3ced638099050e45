//! Server side of the Tether facade protocol
//!
//! This crate answers facade calls against a [`tether_state::State`]:
//! - Dispatcher: routes `(facade, version, request)` to a facade
//! - Authorizer: caller identity and per-entity access checks
//! - Facades: `Service` and `Action`
//! - InProcessConnection: an `ApiCaller` that dispatches in-process
//!
//! State errors never cross the wire as-is; [`server_error`] converts them
//! to coded [`tether_api::ApiError`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authorizer;
pub mod connection;
pub mod dispatcher;
pub mod errors;
pub mod facades;

pub use authorizer::{Authorizer, AuthorizerFn};
pub use connection::InProcessConnection;
pub use dispatcher::Dispatcher;
pub use errors::server_error;
pub use facades::{ActionFacade, Facade, ServiceFacade};
