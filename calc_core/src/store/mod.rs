//! # Document Store
//!
//! The catalog persists through a minimal document-store capability set:
//! `get`, `list`, `put`, `update`, `delete` over hierarchical collection paths.
//! Anything that can offer these five operations can back the catalog.
//!
//! ## Collection Paths
//!
//! ```text
//! materials
//! materials/{materialId}/variants
//! materials/{materialId}/variants/{variantId}/subVariants
//! ```
//!
//! Stores do not cascade: deleting a document leaves any sub-collections under
//! its path untouched. Cascading is the repository's job.
//!
//! ## Backends
//!
//! - [`memory::MemoryStore`] - insertion-ordered in-memory collections
//! - [`file::JsonFileStore`] - a single JSON file with atomic saves and locking
//!
//! ## Example
//!
//! ```rust
//! use calc_core::store::{CollectionPath, Document, DocumentStore, MemoryStore};
//! use serde_json::json;
//!
//! let mut store = MemoryStore::new();
//! let mut doc = Document::new();
//! doc.insert("name".into(), json!("Steel Rod"));
//!
//! let id = store.put(&CollectionPath::materials(), None, doc).unwrap();
//! let loaded = store.get(&CollectionPath::materials(), &id).unwrap();
//! assert_eq!(loaded["name"], "Steel Rod");
//! ```

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;

#[cfg(not(target_arch = "wasm32"))]
pub use file::{FileLock, JsonFileStore, LockInfo};
pub use memory::MemoryStore;

/// A schemaless document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

const MATERIALS: &str = "materials";
const VARIANTS: &str = "variants";
const SUB_VARIANTS: &str = "subVariants";

/// Slash-separated path naming a collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Root collection of materials
    pub fn materials() -> Self {
        CollectionPath(MATERIALS.to_string())
    }

    /// Variants of one material
    pub fn variants(material_id: &str) -> Self {
        CollectionPath(format!("{MATERIALS}/{material_id}/{VARIANTS}"))
    }

    /// Sub-variants of one variant
    pub fn sub_variants(material_id: &str, variant_id: &str) -> Self {
        CollectionPath(format!(
            "{MATERIALS}/{material_id}/{VARIANTS}/{variant_id}/{SUB_VARIANTS}"
        ))
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimal read/write interface the catalog needs from its storage backend.
///
/// Every method fails with `CalcError::NotFound` for a missing id where noted,
/// and with one of the I/O error variants when the backend itself fails.
pub trait DocumentStore {
    /// Fetch one document. `NotFound` if absent.
    fn get(&self, collection: &CollectionPath, id: &str) -> CalcResult<Document>;

    /// All documents in a collection, in store order. An unknown collection is empty.
    fn list(&self, collection: &CollectionPath) -> CalcResult<Vec<(String, Document)>>;

    /// Create or overwrite a document. Assigns a fresh id when `id` is `None`.
    fn put(&mut self, collection: &CollectionPath, id: Option<&str>, document: Document) -> CalcResult<String>;

    /// Merge `partial` into an existing document. `NotFound` if absent.
    fn update(&mut self, collection: &CollectionPath, id: &str, partial: Document) -> CalcResult<()>;

    /// Remove one document. `NotFound` if absent.
    fn delete(&mut self, collection: &CollectionPath, id: &str) -> CalcResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &mut S {
    fn get(&self, collection: &CollectionPath, id: &str) -> CalcResult<Document> {
        (**self).get(collection, id)
    }

    fn list(&self, collection: &CollectionPath) -> CalcResult<Vec<(String, Document)>> {
        (**self).list(collection)
    }

    fn put(&mut self, collection: &CollectionPath, id: Option<&str>, document: Document) -> CalcResult<String> {
        (**self).put(collection, id, document)
    }

    fn update(&mut self, collection: &CollectionPath, id: &str, partial: Document) -> CalcResult<()> {
        (**self).update(collection, id, partial)
    }

    fn delete(&mut self, collection: &CollectionPath, id: &str) -> CalcResult<()> {
        (**self).delete(collection, id)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn get(&self, collection: &CollectionPath, id: &str) -> CalcResult<Document> {
        (**self).get(collection, id)
    }

    fn list(&self, collection: &CollectionPath) -> CalcResult<Vec<(String, Document)>> {
        (**self).list(collection)
    }

    fn put(&mut self, collection: &CollectionPath, id: Option<&str>, document: Document) -> CalcResult<String> {
        (**self).put(collection, id, document)
    }

    fn update(&mut self, collection: &CollectionPath, id: &str, partial: Document) -> CalcResult<()> {
        (**self).update(collection, id, partial)
    }

    fn delete(&mut self, collection: &CollectionPath, id: &str) -> CalcResult<()> {
        (**self).delete(collection, id)
    }
}
