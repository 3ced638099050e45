//! Snapshot files
//!
//! A store can be written to and read back from a single JSON file. The file
//! is written to a sibling temp path, synced, and renamed into place, so a
//! reader never observes a half-written snapshot.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tether_core::{TetherError, TetherResult};

use crate::document::{DocKey, Document, StoredDoc};
use crate::store::DocumentStore;

/// Current snapshot file format version
pub const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    format: u32,
    revision: u64,
    documents: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    collection: String,
    id: String,
    revno: u64,
    fields: Document,
}

impl DocumentStore {
    /// Write every document to `path`
    pub fn save_snapshot(&self, path: &Path) -> TetherResult<()> {
        let (revision, docs) = self.snapshot();
        let file = SnapshotFile {
            format: SNAPSHOT_FORMAT,
            revision,
            documents: docs
                .into_iter()
                .map(|(key, doc)| SnapshotEntry {
                    collection: key.collection,
                    id: key.id,
                    revno: doc.revno,
                    fields: doc.fields,
                })
                .collect(),
        };
        let content = serde_json::to_vec_pretty(&file)?;

        let tmp = path.with_extension("tmp");
        write_synced(&tmp, &content).map_err(|e| {
            TetherError::storage(format!("failed to write snapshot '{}': {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, path).map_err(|e| {
            TetherError::storage(format!(
                "failed to move snapshot into place '{}': {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!(path = %path.display(), revision, "saved store snapshot");
        Ok(())
    }

    /// Load a store from `path`
    pub fn load_snapshot(path: &Path) -> TetherResult<Self> {
        let content = std::fs::read(path).map_err(|e| {
            TetherError::storage(format!("failed to read snapshot '{}': {}", path.display(), e))
        })?;
        let file: SnapshotFile = serde_json::from_slice(&content)?;
        if file.format != SNAPSHOT_FORMAT {
            return Err(TetherError::storage(format!(
                "unsupported snapshot format {} in '{}'",
                file.format,
                path.display()
            )));
        }

        let docs: BTreeMap<DocKey, StoredDoc> = file
            .documents
            .into_iter()
            .map(|e| (DocKey::new(e.collection, e.id), StoredDoc::new(e.fields, e.revno)))
            .collect();
        tracing::debug!(path = %path.display(), revision = file.revision, documents = docs.len(), "loaded store snapshot");
        Ok(DocumentStore::from_parts(file.revision, docs))
    }

    /// Load `path` if it exists, otherwise start empty
    pub fn open_snapshot(path: &Path) -> TetherResult<Self> {
        if path.exists() {
            Self::load_snapshot(path)
        } else {
            Ok(Self::new())
        }
    }
}

/// Write `content` to a fresh file at `path` and flush it to disk
fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::doc_from;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = DocumentStore::new();
        store
            .write(|view| {
                view.put(DocKey::new("units", "env:mysql/0"), doc_from([("name", "mysql/0")]));
                Ok(())
            })
            .unwrap();
        store.save_snapshot(&path).unwrap();

        let loaded = DocumentStore::load_snapshot(&path).unwrap();
        assert_eq!(loaded.current_revision(), 1);
        let doc = loaded.get(&DocKey::new("units", "env:mysql/0")).unwrap();
        assert_eq!(doc.field("name").as_str(), Some("mysql/0"));
        assert_eq!(doc.revno, 1);
    }

    #[test]
    fn test_resave_replaces_snapshot_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let key = DocKey::new("units", "env:mysql/0");

        let store = DocumentStore::new();
        store
            .write(|view| {
                view.put(key.clone(), doc_from([("name", "mysql/0")]));
                Ok(())
            })
            .unwrap();
        store.save_snapshot(&path).unwrap();
        store
            .write(|view| {
                view.put(key.clone(), doc_from([("name", "mysql/1")]));
                Ok(())
            })
            .unwrap();
        store.save_snapshot(&path).unwrap();

        assert!(!path.with_extension("tmp").exists());
        let loaded = DocumentStore::load_snapshot(&path).unwrap();
        assert_eq!(loaded.current_revision(), 2);
        assert_eq!(loaded.get(&key).unwrap().field("name").as_str(), Some("mysql/1"));
    }

    #[test]
    fn test_save_into_missing_dir_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("state.json");
        let err = DocumentStore::new().save_snapshot(&path).unwrap_err();
        assert!(matches!(err, TetherError::Storage { .. }));
        assert!(err.to_string().contains("failed to write snapshot"));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_missing_snapshot_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open_snapshot(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.current_revision(), 0);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(DocumentStore::load_snapshot(&path).is_err());
    }
}
