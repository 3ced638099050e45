//! DocumentStore: shared document storage with revision management
//!
//! This module implements the document substrate using:
//! - `BTreeMap<DocKey, StoredDoc>` for collection-ordered storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for the store-wide revision counter
//!
//! # Design Notes
//!
//! - **No history**: each document stores only its latest fields
//! - **Reads clone**: callers get an owned snapshot, never a reference into
//!   the store, so no lock outlives a call
//! - **Writes go through [`DocumentStore::write`]**: the closure sees a
//!   consistent view and either returns `Ok` with its changes applied or
//!   `Err` with nothing applied
//!
//! The store knows nothing about preconditions; transaction semantics live in
//! the concurrency layer, which validates and applies inside one `write` call.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tether_core::TetherResult;

use crate::document::{DocKey, Document, StoredDoc};

/// Thread-safe document store
///
/// Cloning a `DocumentStore` is cheap and yields another handle to the same
/// documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    /// Main data: collection-ordered map of documents
    data: Arc<RwLock<BTreeMap<DocKey, StoredDoc>>>,
    /// Revision of the last committed write
    revision: Arc<AtomicU64>,
}

impl DocumentStore {
    /// Create a new empty store
    ///
    /// Initial revision is 0 (no writes have occurred).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from previously saved documents
    pub fn from_parts(revision: u64, docs: BTreeMap<DocKey, StoredDoc>) -> Self {
        Self {
            data: Arc::new(RwLock::new(docs)),
            revision: Arc::new(AtomicU64::new(revision)),
        }
    }

    /// Revision of the last committed write
    pub fn current_revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Fetch one document
    pub fn get(&self, key: &DocKey) -> Option<StoredDoc> {
        self.data.read().get(key).cloned()
    }

    /// Check whether a document exists
    pub fn contains(&self, key: &DocKey) -> bool {
        self.data.read().contains_key(key)
    }

    /// All documents of a collection matching `filter`, ordered by id
    pub fn find<F>(&self, collection: &str, filter: F) -> Vec<(String, StoredDoc)>
    where
        F: Fn(&StoredDoc) -> bool,
    {
        let data = self.data.read();
        data.range(DocKey::collection_start(collection)..)
            .take_while(|(key, _)| key.collection == collection)
            .filter(|(_, doc)| filter(doc))
            .map(|(key, doc)| (key.id.clone(), doc.clone()))
            .collect()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.find(collection, |_| true).len()
    }

    /// Copy of every document with the revision they were read at
    pub fn snapshot(&self) -> (u64, BTreeMap<DocKey, StoredDoc>) {
        // Read lock first so the revision cannot move past the cloned data.
        let data = self.data.read();
        let revision = self.current_revision();
        (revision, data.clone())
    }

    /// Run `f` against an exclusive write view
    ///
    /// Changes made through the view are staged and only become visible if
    /// `f` returns `Ok`. The write section is held for the duration of `f`
    /// only, never across calls.
    pub fn write<T, F>(&self, f: F) -> TetherResult<T>
    where
        F: FnOnce(&mut WriteView<'_>) -> TetherResult<T>,
    {
        let mut data = self.data.write();
        let mut view = WriteView {
            data: &*data,
            staged: BTreeMap::new(),
            base_revision: self.current_revision(),
        };
        let out = f(&mut view)?;

        let WriteView { staged, .. } = view;
        if staged.is_empty() {
            return Ok(out);
        }
        let revno = self.current_revision() + 1;
        for (key, change) in staged {
            match change {
                Some(fields) => {
                    data.insert(key, StoredDoc::new(fields, revno));
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        self.revision.store(revno, Ordering::SeqCst);
        Ok(out)
    }
}

/// Staged view over the store used inside [`DocumentStore::write`]
///
/// Reads see staged changes first, then committed documents.
pub struct WriteView<'a> {
    data: &'a BTreeMap<DocKey, StoredDoc>,
    /// `Some(fields)` = put, `None` = remove
    staged: BTreeMap<DocKey, Option<Document>>,
    base_revision: u64,
}

impl WriteView<'_> {
    /// Revision the view started from
    pub fn base_revision(&self) -> u64 {
        self.base_revision
    }

    /// Fields of a document as currently visible in this view
    pub fn get(&self, key: &DocKey) -> Option<Document> {
        match self.staged.get(key) {
            Some(staged) => staged.clone(),
            None => self.data.get(key).map(|doc| doc.fields.clone()),
        }
    }

    /// Check whether a document is visible in this view
    pub fn exists(&self, key: &DocKey) -> bool {
        match self.staged.get(key) {
            Some(staged) => staged.is_some(),
            None => self.data.contains_key(key),
        }
    }

    /// Stage a full-document write
    pub fn put(&mut self, key: DocKey, fields: Document) {
        self.staged.insert(key, Some(fields));
    }

    /// Stage a removal
    pub fn remove(&mut self, key: DocKey) {
        self.staged.insert(key, None);
    }

    /// Number of staged changes
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}
