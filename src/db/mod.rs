//! In-memory record database.
//!
//! Holds the whole [`Document`], hands out scoped ids and writes the document
//! back through its [`DocumentStore`] after every mutation. A failed write is
//! logged and the in-memory change stays in place, so memory and disk can
//! diverge until the next successful write.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::Record;
use crate::persist::{Document, DocumentStore};

pub mod ids;

pub use ids::IdAllocator;

pub type SharedDb = Arc<RwLock<Database>>;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{kind} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid {kind}: {message}")]
    Invalid { kind: &'static str, message: String },
}

impl RecordError {
    fn not_found<T: Record>(id: i64) -> Self {
        Self::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        }
    }

    fn invalid<T: Record>(err: serde_json::Error) -> Self {
        Self::Invalid {
            kind: T::KIND,
            message: err.to_string(),
        }
    }
}

pub struct Database {
    doc: Document,
    ids: IdAllocator,
    store: Box<dyn DocumentStore>,
}

impl Database {
    /// Loads the document from `store`. An unreadable document is logged and
    /// replaced by an empty one.
    pub fn open(store: impl DocumentStore + 'static) -> Self {
        let doc = match store.load() {
            Ok(Some(doc)) => doc,
            Ok(None) => Document::default(),
            Err(e) => {
                tracing::error!(error = %e, "document load failed, starting empty");
                Document::default()
            }
        };
        let ids = IdAllocator::from_document(&doc);
        tracing::info!(
            users = doc.users.len(),
            boards = doc.boards.len(),
            lists = doc.lists.len(),
            tasks = doc.tasks.len(),
            tags = doc.tags.len(),
            "document loaded"
        );
        Self {
            doc,
            ids,
            store: Box::new(store),
        }
    }

    pub fn shared(self) -> SharedDb {
        Arc::new(RwLock::new(self))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn list<T: Record>(&self) -> &[T] {
        T::collection(&self.doc)
    }

    /// First record with `id` in collection order.
    pub fn get<T: Record>(&self, id: i64) -> Result<&T, RecordError> {
        self.list::<T>()
            .iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| RecordError::not_found::<T>(id))
    }

    /// Creates a record from caller-supplied fields.
    ///
    /// The scoped id is placed first, so an explicit `id` in `body` wins;
    /// `created_at` is always stamped by the server.
    pub fn create<T: Record>(&mut self, body: Map<String, Value>) -> Result<T, RecordError> {
        let scope = T::SCOPE_FIELD
            .and_then(|field| body.get(field))
            .and_then(coerce_id);
        let mut fields = Map::new();
        fields.insert("id".into(), Value::from(self.ids.peek::<T>(scope)));
        fields.extend(body);
        if T::STAMPED {
            fields.insert("created_at".into(), Value::String(now_iso()));
        }
        let record: T =
            serde_json::from_value(Value::Object(fields)).map_err(RecordError::invalid::<T>)?;
        self.ids.insert::<T>(record.scope(), record.id());
        T::collection_mut(&mut self.doc).push(record.clone());
        self.persist();
        Ok(record)
    }

    /// Shallow-merges `patch` over the record. Any field may be replaced,
    /// including `id` and the ownership fields.
    pub fn update<T: Record>(
        &mut self,
        id: i64,
        patch: Map<String, Value>,
    ) -> Result<T, RecordError> {
        let idx = self.position::<T>(id)?;
        let current = &T::collection(&self.doc)[idx];
        let (old_scope, old_id) = (current.scope(), current.id());
        let mut value = serde_json::to_value(current).map_err(RecordError::invalid::<T>)?;
        if let Value::Object(fields) = &mut value {
            fields.extend(patch);
        }
        let updated: T = serde_json::from_value(value).map_err(RecordError::invalid::<T>)?;
        self.ids.release::<T>(old_scope, old_id);
        self.ids.insert::<T>(updated.scope(), updated.id());
        T::collection_mut(&mut self.doc)[idx] = updated.clone();
        self.persist();
        Ok(updated)
    }

    /// Removes the record and its dependents, returning the removed record.
    pub fn delete<T: Record>(&mut self, id: i64) -> Result<T, RecordError> {
        let idx = self.position::<T>(id)?;
        let removed = T::collection_mut(&mut self.doc).remove(idx);
        T::cascade(&mut self.doc, &removed);
        // cascades can empty scopes in any collection
        self.ids = IdAllocator::from_document(&self.doc);
        self.persist();
        Ok(removed)
    }

    fn position<T: Record>(&self, id: i64) -> Result<usize, RecordError> {
        self.list::<T>()
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| RecordError::not_found::<T>(id))
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.doc) {
            tracing::warn!(error = %e, "persist failed, in-memory state kept");
        }
    }
}

/// Parses an id the way a loose numeric coercion would: `"101"` and
/// `"101.0"` both name 101, anything non-numeric names nothing.
pub fn parse_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => parse_id(s),
        _ => None,
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
