//! Actions queued against units
//!
//! An action is inserted in the same transaction as an assertion that its
//! receiver exists, so an action can never be queued for a unit that was
//! removed in the meantime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tether_concurrency::{Assert, Op};
use tether_core::{ActionName, ActionTag, ResultExt, TetherError, TetherResult, UnitTag, Value};
use uuid::Uuid;

use crate::docs::{from_document, to_document, ACTIONS_C, UNITS_C};
use crate::state::State;

/// Progress of a queued action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Queued, not yet picked up by the unit
    #[default]
    Pending,
}

impl ActionStatus {
    /// Stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ActionDoc {
    #[serde(rename = "env-uuid")]
    env_uuid: String,
    receiver: String,
    name: String,
    #[serde(default)]
    parameters: Value,
    #[serde(default)]
    status: ActionStatus,
    enqueued: DateTime<Utc>,
}

/// Snapshot of one queued action
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    id: Uuid,
    doc: ActionDoc,
}

impl Action {
    /// Action id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// `action-<uuid>`
    pub fn tag(&self) -> ActionTag {
        ActionTag::new(self.id)
    }

    /// Name of the receiving unit
    pub fn receiver(&self) -> &str {
        &self.doc.receiver
    }

    /// Action name, e.g. `backup`
    pub fn name(&self) -> &str {
        &self.doc.name
    }

    /// Parameters, always an object
    pub fn parameters(&self) -> &Value {
        &self.doc.parameters
    }

    /// Current status
    pub fn status(&self) -> ActionStatus {
        self.doc.status
    }

    /// When the action was queued
    pub fn enqueued(&self) -> DateTime<Utc> {
        self.doc.enqueued
    }
}

fn action_from_stored(st: &State, doc_id: &str, fields: &tether_storage::Document) -> TetherResult<Action> {
    let local = st
        .local_id(doc_id)
        .ok_or_else(|| TetherError::internal(format!("action id {:?} outside environment", doc_id)))?;
    let id = Uuid::parse_str(local)
        .map_err(|e| TetherError::internal(format!("action id {:?}: {}", local, e)))?;
    Ok(Action {
        id,
        doc: from_document(fields)?,
    })
}

impl State {
    /// Queue action `name` for `receiver`
    ///
    /// # Errors
    ///
    /// - `InvalidName` if `name` is not a valid action name
    /// - `InvalidInput` if `parameters` is not an object
    /// - `NotFound` if the receiving unit does not exist
    pub fn enqueue_action(
        &self,
        receiver: &UnitTag,
        name: &str,
        parameters: Value,
    ) -> TetherResult<Action> {
        let name = ActionName::new(name)?;
        let parameters = match parameters {
            Value::Null => Value::Object(Default::default()),
            obj @ Value::Object(_) => obj,
            other => {
                return Err(TetherError::invalid_input(format!(
                    "action parameters must be an object, got {}",
                    other.type_name()
                )))
            }
        };

        let id = Uuid::new_v4();
        let doc = ActionDoc {
            env_uuid: self.env_uuid().to_string(),
            receiver: receiver.id().to_string(),
            name: name.as_str().to_string(),
            parameters,
            status: ActionStatus::Pending,
            enqueued: Utc::now(),
        };
        let ops = [
            Op::assert(UNITS_C, self.doc_id(receiver.id()), Assert::DocExists),
            Op::insert(ACTIONS_C, self.doc_id(&id.to_string()), to_document(&doc)?),
        ];

        self.run_transaction(&ops)
            .map_err(|e| {
                if e.is_txn_aborted() && self.get_doc(UNITS_C, receiver.id()).is_none() {
                    TetherError::not_found(format!("unit {:?}", receiver.id()))
                } else {
                    e
                }
            })
            .annotate_with(|| format!("cannot add action {:?} to unit {}", doc.name, receiver.id()))?;

        tracing::info!(action = %id, receiver = %receiver, name = %doc.name, "action queued");
        Ok(Action { id, doc })
    }

    /// Fetch an action by id
    pub fn action(&self, id: Uuid) -> TetherResult<Action> {
        let doc_id = self.doc_id(&id.to_string());
        let stored = self
            .get_doc(ACTIONS_C, &id.to_string())
            .ok_or_else(|| TetherError::not_found(format!("action {}", id)))?;
        action_from_stored(self, &doc_id, &stored.fields)
    }

    /// Actions queued for `receiver`, oldest first
    pub fn actions_for(&self, receiver: &UnitTag) -> TetherResult<Vec<Action>> {
        let prefix = format!("{}:", self.env_uuid());
        let mut actions = self
            .store()
            .find(ACTIONS_C, |doc| doc.field("receiver").as_str() == Some(receiver.id()))
            .into_iter()
            .filter(|(doc_id, _)| doc_id.starts_with(&prefix))
            .map(|(doc_id, stored)| action_from_stored(self, &doc_id, &stored.fields))
            .collect::<TetherResult<Vec<_>>>()?;
        actions.sort_by(|a, b| a.enqueued().cmp(&b.enqueued()).then(a.id.cmp(&b.id)));
        Ok(actions)
    }
}
