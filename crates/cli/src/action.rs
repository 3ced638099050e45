//! `do` and `show-actions`.
//!
//! `do <unit> <action> [--params FILE]` validates its arguments locally,
//! sends exactly one action through `Action.Enqueue` and prints the id of
//! the queued action under the key `Action queued with id`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tether_api::action::Client;
use tether_api::params::{Action, Actions, Entities};
use tether_core::names::{is_valid_action_name, is_valid_unit};
use tether_core::{ActionName, ActionTag, UnitTag, Value};

use crate::conform::conform;
use crate::error::{check_empty, CommandError};
use crate::format::{render, OutputFormat};

/// Key of the single entry `do` prints
pub const QUEUED_KEY: &str = "Action queued with id";

/// Queue one action on one unit
#[derive(Debug, Clone)]
pub struct DoCommand {
    unit_tag: UnitTag,
    action_name: ActionName,
    params_path: Option<PathBuf>,
    format: OutputFormat,
}

impl DoCommand {
    /// Validate positional `<unit> <action>` arguments.
    pub fn init(
        args: &[String],
        params_path: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<Self, CommandError> {
        let (unit, action, rest) = match args {
            [] => return Err(CommandError::usage("no unit specified")),
            [_] => return Err(CommandError::usage("no action specified")),
            [unit, action, rest @ ..] => (unit, action, rest),
        };
        check_empty(rest)?;
        if !is_valid_unit(unit) {
            return Err(CommandError::usage(format!("invalid unit name {:?}", unit)));
        }
        if !is_valid_action_name(action) {
            return Err(CommandError::usage(format!(
                "invalid action name {:?}",
                action
            )));
        }
        Ok(Self {
            unit_tag: UnitTag::new(unit)?,
            action_name: ActionName::new(action.as_str())?,
            params_path,
            format,
        })
    }

    /// Enqueue the action and print its id.
    pub fn run(&self, client: &Client, out: &mut dyn Write) -> Result<(), CommandError> {
        let parameters = match &self.params_path {
            Some(path) => read_params(path)?,
            None => Value::Object(BTreeMap::new()),
        };

        let request = Actions {
            actions: vec![Action {
                receiver: self.unit_tag.to_string(),
                name: self.action_name.to_string(),
                parameters,
            }],
        };
        let results = client.enqueue(request)?;
        let result = results.one_result().map_err(|err| match err {
            tether_api::Error::CountMismatch { .. } => {
                CommandError::protocol("illegal number of results returned")
            }
            other => other.into(),
        })?;

        if let Some(err) = result.error {
            return Err(tether_api::Error::Server(err).into());
        }
        let queued = result
            .action
            .ok_or_else(|| CommandError::protocol("action failed to enqueue"))?;
        let tag = ActionTag::parse(&queued.tag)?;

        tracing::debug!(action = %tag, unit = %self.unit_tag.id(), "action queued");
        let output = BTreeMap::from([(QUEUED_KEY, tag.id().to_string())]);
        writeln!(out, "{}", render(&output, self.format)?).map_err(CommandError::output)
    }
}

/// Read, decode and normalize a YAML parameters file.
///
/// An empty file is an empty parameter set.
pub fn read_params(path: &Path) -> Result<Value, CommandError> {
    let bytes = std::fs::read(path).map_err(|e| CommandError::read_file(path, e))?;
    let doc: serde_yaml::Value = serde_yaml::from_slice(&bytes)?;
    match conform(&doc)? {
        Value::Null => Ok(Value::Object(BTreeMap::new())),
        params @ Value::Object(_) => Ok(params),
        _ => Err(CommandError::ParamsNotMap),
    }
}

/// One line of `show-actions` output
#[derive(Debug, Serialize)]
struct ActionSummary {
    id: String,
    action: String,
    status: String,
    enqueued: String,
    #[serde(skip_serializing_if = "params_empty")]
    parameters: Value,
}

fn params_empty(v: &Value) -> bool {
    v.is_null() || v.as_object().is_some_and(|m| m.is_empty())
}

/// List the actions queued for a unit, oldest first.
pub fn show_actions(
    client: &Client,
    unit: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    if !is_valid_unit(unit) {
        return Err(CommandError::usage(format!("invalid unit name {:?}", unit)));
    }
    let tag = UnitTag::new(unit)?;
    let mut listing = client.actions(Entities::from_tags([tag.to_string()]))?;
    let receiver = listing
        .actions
        .pop()
        .ok_or_else(|| CommandError::protocol("illegal number of results returned"))?;
    if let Some(err) = receiver.error {
        return Err(tether_api::Error::Server(err).into());
    }

    let mut summaries = Vec::with_capacity(receiver.actions.len());
    for result in receiver.actions {
        let Some(action) = result.action else {
            continue;
        };
        summaries.push(ActionSummary {
            id: ActionTag::parse(&action.tag)?.id().to_string(),
            action: action.name,
            status: result.status,
            enqueued: result.enqueued,
            parameters: action.parameters,
        });
    }
    writeln!(out, "{}", render(&summaries, format)?).map_err(CommandError::output)
}
