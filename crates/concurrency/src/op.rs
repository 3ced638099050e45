//! Transaction operations
//!
//! An [`Op`] targets one document and combines an optional precondition
//! ([`Assert`]) with one action: insert, update, remove, or nothing (a pure
//! assertion). A transaction is an ordered list of ops applied as one unit.
//!
//! Removal ops are built without a precondition: they succeed whenever the
//! document exists.

use tether_core::Value;
use tether_storage::{DocKey, Document};

/// Precondition over a document's current fields
///
/// Missing fields read as `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Assert {
    /// The document exists
    DocExists,
    /// The document does not exist
    DocMissing,
    /// The document exists and `field == value`
    FieldEq(String, Value),
    /// The document exists and `field` is one of `values`
    FieldIn(String, Vec<Value>),
    /// Every assertion holds
    All(Vec<Assert>),
}

impl Assert {
    /// `field == value`
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Assert::FieldEq(field.into(), value.into())
    }

    /// `field ∈ values`
    pub fn field_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Assert::FieldIn(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// The field is absent (reads as `Null`)
    pub fn field_unset(field: impl Into<String>) -> Self {
        Assert::FieldEq(field.into(), Value::Null)
    }

    /// Evaluate against a document, `None` meaning the document is absent
    pub fn holds(&self, doc: Option<&Document>) -> bool {
        fn field<'a>(doc: &'a Document, name: &str) -> &'a Value {
            static NULL: Value = Value::Null;
            doc.get(name).unwrap_or(&NULL)
        }

        match self {
            Assert::DocExists => doc.is_some(),
            Assert::DocMissing => doc.is_none(),
            Assert::FieldEq(name, value) => doc.is_some_and(|d| field(d, name) == value),
            Assert::FieldIn(name, values) => {
                doc.is_some_and(|d| values.contains(field(d, name)))
            }
            Assert::All(asserts) => asserts.iter().all(|a| a.holds(doc)),
        }
    }
}

/// Field assignments applied by an update op
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    /// Fields to assign
    pub set: Document,
    /// Fields to delete
    pub unset: Vec<String>,
}

impl Update {
    /// Assign the given fields
    pub fn set<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Update {
            set: tether_storage::doc_from(fields),
            unset: Vec::new(),
        }
    }

    /// Also delete `field`
    pub fn and_unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    /// Apply to a document in place
    pub fn apply(&self, doc: &mut Document) {
        for (k, v) in &self.set {
            doc.insert(k.clone(), v.clone());
        }
        for k in &self.unset {
            doc.remove(k);
        }
    }
}

/// What an op does once its precondition holds
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    /// Only check the precondition
    AssertOnly,
    /// Create the document; aborts if it already exists
    Insert(Document),
    /// Modify an existing document
    Update(Update),
    /// Delete an existing document
    Remove,
}

/// One guarded operation on one document
#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    /// Target document
    pub key: DocKey,
    /// Precondition checked atomically with the rest of the transaction
    pub assert: Option<Assert>,
    /// Mutation applied when the precondition holds
    pub kind: OpKind,
}

impl Op {
    /// Assertion-only op
    pub fn assert(collection: &str, id: impl Into<String>, assert: Assert) -> Self {
        Op {
            key: DocKey::new(collection, id),
            assert: Some(assert),
            kind: OpKind::AssertOnly,
        }
    }

    /// Insert op
    pub fn insert(collection: &str, id: impl Into<String>, doc: Document) -> Self {
        Op {
            key: DocKey::new(collection, id),
            assert: None,
            kind: OpKind::Insert(doc),
        }
    }

    /// Update op
    pub fn update(collection: &str, id: impl Into<String>, update: Update) -> Self {
        Op {
            key: DocKey::new(collection, id),
            assert: None,
            kind: OpKind::Update(update),
        }
    }

    /// Unconditional removal op
    pub fn remove(collection: &str, id: impl Into<String>) -> Self {
        Op {
            key: DocKey::new(collection, id),
            assert: None,
            kind: OpKind::Remove,
        }
    }

    /// Attach a precondition
    pub fn with_assert(mut self, assert: Assert) -> Self {
        self.assert = Some(assert);
        self
    }
}
