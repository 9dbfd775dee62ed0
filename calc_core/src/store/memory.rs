//! In-memory document store.
//!
//! Collections keep documents in insertion order; overwriting an existing id
//! keeps its position. Ids are random UUIDs in simple (hyphen-less) form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{CollectionPath, Document, DocumentStore};
use crate::errors::{CalcError, CalcResult};

/// A document plus the id it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Document store backed by ordinary maps.
///
/// Also serves as the serialized body of [`super::JsonFileStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    collections: BTreeMap<CollectionPath, Vec<StoredDocument>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of documents across all collections
    pub fn document_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Whether a collection holds at least one document
    pub fn has_documents(&self, collection: &CollectionPath) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|docs| !docs.is_empty())
    }

    fn position(&self, collection: &CollectionPath, id: &str) -> Option<usize> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.iter().position(|d| d.id == id))
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &CollectionPath, id: &str) -> CalcResult<Document> {
        debug!(%collection, id, "get");
        self.collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(|d| d.data.clone())
            .ok_or_else(|| CalcError::not_found(collection.as_str(), id))
    }

    fn list(&self, collection: &CollectionPath) -> CalcResult<Vec<(String, Document)>> {
        debug!(%collection, "list");
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.iter().map(|d| (d.id.clone(), d.data.clone())).collect())
            .unwrap_or_default())
    }

    fn put(&mut self, collection: &CollectionPath, id: Option<&str>, document: Document) -> CalcResult<String> {
        let id = match id {
            Some(id) if id.is_empty() => {
                return Err(CalcError::validation("id", "Document id must not be empty"));
            }
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };
        debug!(%collection, id = %id, "put");

        let docs = self.collections.entry(collection.clone()).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(existing) => existing.data = document,
            None => docs.push(StoredDocument {
                id: id.clone(),
                data: document,
            }),
        }
        Ok(id)
    }

    fn update(&mut self, collection: &CollectionPath, id: &str, partial: Document) -> CalcResult<()> {
        debug!(%collection, id, fields = partial.len(), "update");
        let doc = self
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| CalcError::not_found(collection.as_str(), id))?;
        for (key, value) in partial {
            doc.data.insert(key, value);
        }
        Ok(())
    }

    fn delete(&mut self, collection: &CollectionPath, id: &str) -> CalcResult<()> {
        debug!(%collection, id, "delete");
        let index = self
            .position(collection, id)
            .ok_or_else(|| CalcError::not_found(collection.as_str(), id))?;
        if let Some(docs) = self.collections.get_mut(collection) {
            docs.remove(index);
            if docs.is_empty() {
                self.collections.remove(collection);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(name: &str) -> Document {
        let mut doc = Document::new();
        doc.insert("name".into(), json!(name));
        doc
    }

    #[test]
    fn test_put_assigns_id() {
        let mut store = MemoryStore::new();
        let id = store.put(&CollectionPath::materials(), None, named("Brass")).unwrap();
        assert_eq!(id.len(), 32);
        assert_eq!(store.get(&CollectionPath::materials(), &id).unwrap()["name"], "Brass");
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut store = MemoryStore::new();
        let path = CollectionPath::materials();
        store.put(&path, Some("z"), named("Zinc")).unwrap();
        store.put(&path, Some("a"), named("Aluminium")).unwrap();
        store.put(&path, Some("m"), named("Mild Steel")).unwrap();

        let ids: Vec<String> = store.list(&path).unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let mut store = MemoryStore::new();
        let path = CollectionPath::materials();
        store.put(&path, Some("a"), named("First")).unwrap();
        store.put(&path, Some("b"), named("Second")).unwrap();
        store.put(&path, Some("a"), named("Replaced")).unwrap();

        let listed = store.list(&path).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0, "a");
        assert_eq!(listed[0].1["name"], "Replaced");
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = MemoryStore::new();
        let path = CollectionPath::materials();
        let mut doc = named("Copper");
        doc.insert("density".into(), json!(8.96));
        let id = store.put(&path, None, doc).unwrap();

        store.update(&path, &id, named("Copper C101")).unwrap();
        let loaded = store.get(&path, &id).unwrap();
        assert_eq!(loaded["name"], "Copper C101");
        assert_eq!(loaded["density"], 8.96);
    }

    #[test]
    fn test_missing_documents() {
        let mut store = MemoryStore::new();
        let path = CollectionPath::variants("nope");
        assert!(store.get(&path, "x").unwrap_err().is_not_found());
        assert!(store.update(&path, "x", Document::new()).unwrap_err().is_not_found());
        assert!(store.delete(&path, "x").unwrap_err().is_not_found());
        assert!(store.list(&path).unwrap().is_empty());
    }

    #[test]
    fn test_delete_does_not_cascade() {
        let mut store = MemoryStore::new();
        let mid = store.put(&CollectionPath::materials(), None, named("Pipe")).unwrap();
        store.put(&CollectionPath::variants(&mid), None, named("1 inch")).unwrap();

        store.delete(&CollectionPath::materials(), &mid).unwrap();
        assert!(store.has_documents(&CollectionPath::variants(&mid)));
        assert_eq!(store.document_count(), 1);
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut store = MemoryStore::new();
        let err = store.put(&CollectionPath::materials(), Some(""), Document::new()).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
