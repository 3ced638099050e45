//! Facade implementations.
//!
//! Each facade is built per call from the shared [`State`] and the caller's
//! [`Authorizer`], so it carries no state of its own.
//!
//! | Facade | Version | Requests |
//! |--------|---------|----------|
//! | `Service` | 1 | `SetMetricCredentials` |
//! | `Action` | 1 | `Enqueue`, `ListAll` |

pub mod action;
pub mod service;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tether_api::error::CODE_NOT_IMPLEMENTED;
use tether_api::ApiError;
use tether_state::State;

use crate::authorizer::Authorizer;

pub use action::ActionFacade;
pub use service::ServiceFacade;

/// A facade bound to one caller
pub trait Facade: Send + Sync {
    /// Handle `request` with raw `params`
    fn call(&self, request: &str, params: serde_json::Value) -> Result<serde_json::Value, ApiError>;
}

/// Builds a facade for one caller; fails if the caller may not use it
pub type FacadeFactory = fn(&State, &Authorizer) -> Result<Box<dyn Facade>, ApiError>;

pub(crate) fn decode<A: DeserializeOwned>(request: &str, params: serde_json::Value) -> Result<A, ApiError> {
    serde_json::from_value(params)
        .map_err(|e| ApiError::message(format!("cannot decode {} params: {}", request, e)))
}

pub(crate) fn encode<R: Serialize>(result: &R) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(result)
        .map_err(|e| ApiError::message(format!("cannot encode result: {}", e)))
}

pub(crate) fn unknown_request(facade: &str, request: &str) -> ApiError {
    ApiError::new(
        format!("unknown request {}.{}", facade, request),
        CODE_NOT_IMPLEMENTED,
    )
}
