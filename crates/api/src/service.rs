//! Client for the `Service` facade

use std::sync::Arc;

use crate::caller::{ApiCaller, FacadeCallFn, FacadeCaller};
use crate::error::Result;
use crate::params::{ErrorResults, ServiceMetricCredential, ServiceMetricCredentials};

/// Facade name
pub const FACADE: &str = "Service";
/// Facade version spoken by this client
pub const VERSION: u32 = 1;

/// Typed `Service` facade client
#[derive(Debug, Clone)]
pub struct Client {
    facade: FacadeCaller,
}

impl Client {
    /// Client dispatching through `caller`
    pub fn new(caller: Arc<dyn ApiCaller>) -> Self {
        Self {
            facade: FacadeCaller::new(caller, FACADE, VERSION),
        }
    }

    /// Replace the dispatch function
    pub fn patch_facade_call(&mut self, call: FacadeCallFn) {
        self.facade.patch_facade_call(call);
    }

    /// Set the metric credentials of one service
    pub fn set_metric_credentials(&self, service: &str, credentials: &[u8]) -> Result<()> {
        let args = ServiceMetricCredentials {
            creds: vec![ServiceMetricCredential {
                service_name: service.to_string(),
                metric_credentials: credentials.to_vec(),
            }],
        };
        let results: ErrorResults = self.facade.facade_call("SetMetricCredentials", &args)?;
        results.one_error()
    }
}
