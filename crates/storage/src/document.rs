//! Document types
//!
//! A document is a flat map of field name to [`Value`], addressed by a
//! collection name and a document id. Every stored document also carries the
//! store revision of the transaction that last wrote it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tether_core::Value;

/// Field map of one document
pub type Document = BTreeMap<String, Value>;

/// Address of a document: collection plus id
///
/// Ordering is collection-major, so every document of one collection forms a
/// contiguous range in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocKey {
    /// Collection name, e.g. `ipaddresses`
    pub collection: String,
    /// Document id, unique within the collection
    pub id: String,
}

impl DocKey {
    /// Create a new document key
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Lowest possible key within a collection
    pub(crate) fn collection_start(collection: &str) -> Self {
        Self::new(collection, String::new())
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDoc {
    /// Field values
    pub fields: Document,
    /// Revision of the transaction that last wrote this document
    pub revno: u64,
}

impl StoredDoc {
    /// Create a stored document at a revision
    pub fn new(fields: Document, revno: u64) -> Self {
        Self { fields, revno }
    }

    /// Read a field; absent fields read as `Null`
    pub fn field(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(name).unwrap_or(&NULL)
    }
}

/// Build a [`Document`] from `(field, value)` pairs
///
/// ```ignore
/// let doc = doc_from([("value", Value::from("10.0.0.1")), ("state", Value::from(""))]);
/// ```
pub fn doc_from<I, K, V>(fields: I) -> Document
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
