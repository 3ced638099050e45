//! The `Service` facade.

use tether_api::params::{ErrorResult, ErrorResults, ServiceMetricCredentials};
use tether_api::ApiError;
use tether_core::{ServiceTag, Tag};
use tether_state::State;

use super::{decode, encode, unknown_request, Facade};
use crate::authorizer::Authorizer;
use crate::errors::server_error;

/// Server side of the `Service` facade
pub struct ServiceFacade {
    st: State,
    authorizer: Authorizer,
}

impl ServiceFacade {
    /// Bind the facade to a caller; only clients may use it
    pub fn new(st: &State, authorizer: &Authorizer) -> Result<Self, ApiError> {
        if !authorizer.auth_client() {
            return Err(ApiError::perm());
        }
        Ok(Self {
            st: st.clone(),
            authorizer: authorizer.clone(),
        })
    }

    pub(crate) fn factory(st: &State, authorizer: &Authorizer) -> Result<Box<dyn Facade>, ApiError> {
        Ok(Box::new(Self::new(st, authorizer)?))
    }

    /// Set metric credentials; one result per entry
    pub fn set_metric_credentials(&self, args: ServiceMetricCredentials) -> ErrorResults {
        let results = args
            .creds
            .into_iter()
            .map(|cred| {
                let tag = match ServiceTag::new(&cred.service_name) {
                    Ok(tag) => Tag::Service(tag),
                    Err(e) => return ErrorResult::failed(server_error(&e)),
                };
                if !self.authorizer.can_access(&tag) {
                    return ErrorResult::failed(ApiError::perm());
                }
                let outcome = self
                    .st
                    .service(&cred.service_name)
                    .and_then(|mut svc| svc.set_metric_credentials(&cred.metric_credentials));
                match outcome {
                    Ok(()) => ErrorResult::default(),
                    Err(e) => ErrorResult::failed(server_error(&e)),
                }
            })
            .collect();
        ErrorResults { results }
    }
}

impl Facade for ServiceFacade {
    fn call(&self, request: &str, params: serde_json::Value) -> Result<serde_json::Value, ApiError> {
        match request {
            "SetMetricCredentials" => {
                encode(&self.set_metric_credentials(decode(request, params)?))
            }
            _ => Err(unknown_request("Service", request)),
        }
    }
}
