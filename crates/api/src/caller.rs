//! Facade call plumbing
//!
//! ```text
//! typed client ──► FacadeCaller::facade_call(request, &args)
//!                    │ serde_json::to_value
//!                    ▼
//!                  FacadeCallFn(request, params)   ◄── patch_facade_call swaps this
//!                    │ default: ApiCaller::api_call(facade, version, request, params)
//!                    ▼
//!                  serde_json::from_value ──► typed response
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Transport-agnostic "invoke a named remote operation" primitive
///
/// Implementations must be safe to call from several threads at once.
pub trait ApiCaller: Send + Sync {
    /// Invoke `facade.request` at `version` with `params`
    fn api_call(
        &self,
        facade: &str,
        version: u32,
        request: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// Dispatch function used by a [`FacadeCaller`]: `(request, params) -> response`
pub type FacadeCallFn =
    Arc<dyn Fn(&str, serde_json::Value) -> Result<serde_json::Value> + Send + Sync>;

/// Calls requests on one facade at one version
#[derive(Clone)]
pub struct FacadeCaller {
    facade: String,
    version: u32,
    call: FacadeCallFn,
}

impl fmt::Debug for FacadeCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacadeCaller")
            .field("facade", &self.facade)
            .field("version", &self.version)
            .finish()
    }
}

impl FacadeCaller {
    /// Caller dispatching through `caller`
    pub fn new(caller: Arc<dyn ApiCaller>, facade: impl Into<String>, version: u32) -> Self {
        let facade = facade.into();
        let name = facade.clone();
        let call: FacadeCallFn = Arc::new(move |request: &str, params: serde_json::Value| {
            caller.api_call(&name, version, request, params)
        });
        Self {
            facade,
            version,
            call,
        }
    }

    /// Facade name
    pub fn facade(&self) -> &str {
        &self.facade
    }

    /// Facade version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Replace the dispatch function
    pub fn patch_facade_call(&mut self, call: FacadeCallFn) {
        self.call = call;
    }

    /// Call `request` with `args`, decoding the response as `R`
    pub fn facade_call<A, R>(&self, request: &str, args: &A) -> Result<R>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let op = format!("{}.{}", self.facade, request);
        let params = serde_json::to_value(args)
            .map_err(|e| Error::protocol(format!("cannot encode {} request: {}", op, e)))?;

        tracing::debug!(facade = %self.facade, version = self.version, request, "facade call");
        let response = (self.call)(request, params)?;

        serde_json::from_value(response).map_err(|e| Error::Decode {
            op,
            reason: e.to_string(),
        })
    }
}
