//! The Dispatcher - single entry point for facade calls.
//!
//! Routes `(facade, version, request, params)` to the registered facade and
//! returns the encoded response or the wire error.

use std::collections::BTreeMap;

use tether_api::error::CODE_NOT_IMPLEMENTED;
use tether_api::ApiError;
use tether_state::State;

use crate::authorizer::Authorizer;
use crate::facades::{ActionFacade, FacadeFactory, ServiceFacade};

/// Routes facade calls for one authenticated caller
///
/// # Thread Safety
///
/// Dispatcher is `Send + Sync` and can be shared across threads.
pub struct Dispatcher {
    st: State,
    authorizer: Authorizer,
    facades: BTreeMap<(&'static str, u32), FacadeFactory>,
}

impl Dispatcher {
    /// Create a dispatcher with the standard facades registered
    pub fn new(st: State, authorizer: Authorizer) -> Self {
        let mut facades: BTreeMap<(&'static str, u32), FacadeFactory> = BTreeMap::new();
        facades.insert(("Service", 1), ServiceFacade::factory);
        facades.insert(("Action", 1), ActionFacade::factory);
        Self {
            st,
            authorizer,
            facades,
        }
    }

    /// The caller this dispatcher serves
    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    /// Dispatch one call
    pub fn dispatch(
        &self,
        facade: &str,
        version: u32,
        request: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        let factory = self
            .facades
            .iter()
            .find(|((name, v), _)| *name == facade && *v == version)
            .map(|(_, factory)| *factory)
            .ok_or_else(|| {
                ApiError::new(
                    format!("unknown facade {} version {}", facade, version),
                    CODE_NOT_IMPLEMENTED,
                )
            })?;

        tracing::info!(
            facade,
            version,
            request,
            caller = self.authorizer.tag(),
            "dispatching facade call"
        );
        let result = factory(&self.st, &self.authorizer)?.call(request, params);
        if let Err(e) = &result {
            tracing::debug!(facade, request, code = %e.code, error = %e.message, "facade call failed");
        }
        result
    }
}
