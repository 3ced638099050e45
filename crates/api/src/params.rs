//! Request and response types exchanged with facades
//!
//! Batched calls send a list of items and get back exactly one result per
//! item, in the same order. [`check_count`] guards that contract on the
//! client side.

use serde::{Deserialize, Serialize};
use tether_core::Value;

use crate::error::{ApiError, Error, Result};

/// Verify a batched response carried `expected` results
pub fn check_count(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::CountMismatch { expected, actual });
    }
    Ok(())
}

// ============================================================================
// Generic results
// ============================================================================

/// One result of a batched call that returns nothing on success
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    /// Failure for this item, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ErrorResult {
    /// Failed result
    pub fn failed(error: ApiError) -> Self {
        Self { error: Some(error) }
    }
}

/// Results of a batched call that returns nothing on success
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResults {
    /// One entry per request item
    #[serde(default)]
    pub results: Vec<ErrorResult>,
}

impl ErrorResults {
    /// Collapse a one-item batch into that item's outcome
    pub fn one_error(self) -> Result<()> {
        check_count(1, self.results.len())?;
        match self.results.into_iter().next().and_then(|r| r.error) {
            Some(err) => Err(Error::Server(err)),
            None => Ok(()),
        }
    }
}

/// An entity reference by tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity tag, e.g. `unit-mysql-0`
    pub tag: String,
}

/// A batch of entity references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    /// The entities
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Entities {
    /// Build from tag strings
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entities: tags.into_iter().map(|tag| Entity { tag: tag.into() }).collect(),
        }
    }
}

// ============================================================================
// Service facade
// ============================================================================

/// New metric credentials for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetricCredential {
    /// Service name
    pub service_name: String,
    /// Raw credential bytes, base64 on the wire
    #[serde(with = "base64_bytes")]
    pub metric_credentials: Vec<u8>,
}

/// Arguments of `Service.SetMetricCredentials`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetricCredentials {
    /// One entry per service
    #[serde(default)]
    pub creds: Vec<ServiceMetricCredential>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Action facade
// ============================================================================

/// An action to queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Receiver tag, e.g. `unit-mysql-0`
    pub receiver: String,
    /// Action name
    pub name: String,
    /// String-keyed parameter object
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
}

/// Arguments of `Action.Enqueue`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actions {
    /// Actions, answered in order
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Reference to a queued action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRef {
    /// Action tag, `action-<uuid>`
    pub tag: String,
    /// Receiver tag; filled in listings
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receiver: String,
    /// Action name; filled in listings
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Parameters; filled in listings
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
}

impl ActionRef {
    /// Reference carrying only the tag
    pub fn tag_only(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            receiver: String::new(),
            name: String::new(),
            parameters: Value::Null,
        }
    }
}

/// Outcome for one action
///
/// A well-behaved server populates exactly one of `action` and `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// The queued action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionRef>,
    /// Status, in listings
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// RFC 3339 enqueue time, in listings
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub enqueued: String,
    /// Failure for this action, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ActionResult {
    /// Failed result
    pub fn failed(error: ApiError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Results of `Action.Enqueue`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResults {
    /// One entry per requested action
    #[serde(default)]
    pub results: Vec<ActionResult>,
}

impl ActionResults {
    /// The single result of a one-item batch
    pub fn one_result(self) -> Result<ActionResult> {
        check_count(1, self.results.len())?;
        self.results
            .into_iter()
            .next()
            .ok_or(Error::CountMismatch {
                expected: 1,
                actual: 0,
            })
    }
}

/// Actions queued for one receiver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionsByReceiver {
    /// Receiver tag
    pub receiver: String,
    /// Queued actions, oldest first
    #[serde(default)]
    pub actions: Vec<ActionResult>,
    /// Failure for this receiver, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// Results of `Action.ListAll`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionsByReceivers {
    /// One entry per requested receiver
    #[serde(default)]
    pub actions: Vec<ActionsByReceiver>,
}
