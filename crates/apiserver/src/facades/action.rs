//! The `Action` facade.
//!
//! Batches are processed item by item: a failing action does not undo or
//! prevent the others.

use tether_api::params::{
    Action, ActionRef, ActionResult, ActionResults, Actions, ActionsByReceiver,
    ActionsByReceivers, Entities,
};
use tether_api::ApiError;
use tether_core::{Tag, TetherError, UnitTag};
use tether_state::State;

use super::{decode, encode, unknown_request, Facade};
use crate::authorizer::Authorizer;
use crate::errors::server_error;

/// Server side of the `Action` facade
pub struct ActionFacade {
    st: State,
    authorizer: Authorizer,
}

impl ActionFacade {
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

    /// Parse a receiver tag, which must name a unit the caller may access
    fn receiver(&self, tag: &str) -> Result<UnitTag, ApiError> {
        let unit = match Tag::parse(tag) {
            Ok(Tag::Unit(unit)) => unit,
            Ok(_) => {
                return Err(server_error(&TetherError::invalid_input(format!(
                    "{:?} is not a valid unit tag",
                    tag
                ))))
            }
            Err(e) => return Err(server_error(&e)),
        };
        if !self.authorizer.can_access(&Tag::Unit(unit.clone())) {
            return Err(ApiError::perm());
        }
        Ok(unit)
    }

    fn enqueue_one(&self, action: Action) -> Result<ActionRef, ApiError> {
        let receiver = self.receiver(&action.receiver)?;
        let queued = self
            .st
            .enqueue_action(&receiver, &action.name, action.parameters)
            .map_err(|e| server_error(&e))?;
        Ok(ActionRef::tag_only(queued.tag().to_string()))
    }

    /// Queue actions; one result per action, in request order
    pub fn enqueue(&self, args: Actions) -> ActionResults {
        let results = args
            .actions
            .into_iter()
            .map(|action| match self.enqueue_one(action) {
                Ok(queued) => ActionResult {
                    action: Some(queued),
                    ..ActionResult::default()
                },
                Err(e) => ActionResult::failed(e),
            })
            .collect();
        ActionResults { results }
    }

    fn list_one(&self, tag: &str) -> Result<Vec<ActionResult>, ApiError> {
        let receiver = self.receiver(tag)?;
        let actions = self
            .st
            .actions_for(&receiver)
            .map_err(|e| server_error(&e))?;
        Ok(actions
            .into_iter()
            .map(|action| ActionResult {
                action: Some(ActionRef {
                    tag: action.tag().to_string(),
                    receiver: receiver.to_string(),
                    name: action.name().to_string(),
                    parameters: action.parameters().clone(),
                }),
                status: action.status().as_str().to_string(),
                enqueued: action.enqueued().to_rfc3339(),
                error: None,
            })
            .collect())
    }

    /// Actions queued for each receiver, oldest first
    pub fn list_all(&self, args: Entities) -> ActionsByReceivers {
        let actions = args
            .entities
            .into_iter()
            .map(|entity| match self.list_one(&entity.tag) {
                Ok(actions) => ActionsByReceiver {
                    receiver: entity.tag,
                    actions,
                    error: None,
                },
                Err(e) => ActionsByReceiver {
                    receiver: entity.tag,
                    actions: Vec::new(),
                    error: Some(e),
                },
            })
            .collect();
        ActionsByReceivers { actions }
    }
}

impl Facade for ActionFacade {
    fn call(&self, request: &str, params: serde_json::Value) -> Result<serde_json::Value, ApiError> {
        match request {
            "Enqueue" => encode(&self.enqueue(decode(request, params)?)),
            "ListAll" => encode(&self.list_all(decode(request, params)?)),
            _ => Err(unknown_request("Action", request)),
        }
    }
}
