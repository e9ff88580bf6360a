//! Whole-document persistence.
//!
//! The board keeps every collection in one [`Document`]. A [`DocumentStore`]
//! loads it once at startup and writes it back in full after each mutation.
//! [`JsonFileStore`] is the production backend; [`MemoryStore`] backs tests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::{Board, List, Tag, Task, User};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub boards: Vec<Board>,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

pub trait DocumentStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Document>>;

    fn save(&self, doc: &Document) -> Result<()>;
}

/// Pretty-printed JSON file, replaced through a sibling temp file on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "db.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Option<Document>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let doc: Document = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(doc))
    }

    fn save(&self, doc: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(doc)?;
        let tmp = self.temp_path();
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests; clones share the saved document.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Option<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Some(doc))),
        }
    }

    /// Last document handed to [`DocumentStore::save`].
    pub fn snapshot(&self) -> Option<Document> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<Document>> {
        Ok(self.snapshot())
    }

    fn save(&self, doc: &Document) -> Result<()> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(doc.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> Document {
        Document {
            users: vec![User {
                id: 1,
                username: "an".into(),
                email: "an@example.com".into(),
                password: "pw".into(),
                created_at: Utc::now(),
            }],
            ..Document::default()
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("db.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_roundtrip_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");
        let store = JsonFileStore::new(&path);
        let doc = sample();
        store.save(&doc).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(doc));
        assert!(!dir.path().join("nested").join("db.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(JsonFileStore::new(&path).load().is_err());
    }

    #[test]
    fn partial_document_fills_missing_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, br#"{"users": []}"#).unwrap();
        let doc = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert!(doc.boards.is_empty() && doc.tags.is_empty());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.save(&sample()).unwrap();
        let seen = other.snapshot().unwrap();
        assert_eq!(seen.users.len(), 1);
        assert_eq!(seen.users[0].email, "an@example.com");
    }
}
