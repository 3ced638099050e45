//! Conversions between typed documents and stored fields

use serde::de::DeserializeOwned;
use serde::Serialize;
use tether_core::TetherResult;
use tether_storage::Document;

/// Collection names
pub(crate) const IPADDRESSES_C: &str = "ipaddresses";
pub(crate) const SERVICES_C: &str = "services";
pub(crate) const UNITS_C: &str = "units";
pub(crate) const ACTIONS_C: &str = "actions";
pub(crate) const SEQUENCE_C: &str = "sequence";

pub(crate) fn to_document<T: Serialize>(doc: &T) -> TetherResult<Document> {
    let json = serde_json::to_value(doc)?;
    Ok(serde_json::from_value(json)?)
}

pub(crate) fn from_document<T: DeserializeOwned>(fields: &Document) -> TetherResult<T> {
    let json = serde_json::to_value(fields)?;
    Ok(serde_json::from_value(json)?)
}
