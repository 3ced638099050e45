//! Client for the `Action` facade

use std::sync::Arc;

use crate::caller::{ApiCaller, FacadeCallFn, FacadeCaller};
use crate::error::Result;
use crate::params::{ActionResults, Actions, ActionsByReceivers, Entities};

/// Facade name
pub const FACADE: &str = "Action";
/// Facade version spoken by this client
pub const VERSION: u32 = 1;

/// Typed `Action` facade client
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

    /// Queue actions; one result per action, in order
    ///
    /// The result count is not checked here; callers that sent a known
    /// number of actions should check it.
    pub fn enqueue(&self, actions: Actions) -> Result<ActionResults> {
        self.facade.facade_call("Enqueue", &actions)
    }

    /// Actions queued for each receiver
    pub fn actions(&self, receivers: Entities) -> Result<ActionsByReceivers> {
        let expected = receivers.entities.len();
        let results: ActionsByReceivers = self.facade.facade_call("ListAll", &receivers)?;
        crate::params::check_count(expected, results.actions.len())?;
        Ok(results)
    }
}
