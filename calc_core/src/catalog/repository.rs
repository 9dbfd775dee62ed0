//! # Catalog Repository
//!
//! Reads and writes the material hierarchy through a [`DocumentStore`]. The
//! store handle is passed in at construction; the repository keeps no cache,
//! so every call sees the store as it is right now.
//!
//! ## Multi-document writes
//!
//! Creating a material with variants and sub-variants, and every cascading
//! delete, spans several store writes. None of them are atomic:
//!
//! - **Creation**: every write is attempted, the first failure is reported,
//!   nothing is rolled back. Children of a failed parent are skipped since
//!   there is nothing to attach them to. The store is left partially
//!   populated and the ids involved are logged at `warn`.
//! - **Deletion**: children are removed before their parent and the first
//!   failure stops the cascade, so a half-finished delete never leaves
//!   orphans behind a missing parent.
//!
//! ## Unreadable documents
//!
//! Stored documents that do not decode (a legacy sub-variant with the wrong
//! coefficient field, say) are reported as `SerializationError` by the
//! single-node reads. [`CatalogRepository::load_catalog`] skips them with a
//! `warn!`. Updates and deletes only need the raw document, so they still
//! work: an update that supplies the right coefficient repairs the node.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::catalog::{CatalogRepository, FormulaKind, MaterialSpec, Selection};
//! use calc_core::store::MemoryStore;
//!
//! let mut repo = CatalogRepository::new(MemoryStore::new());
//! let id = repo
//!     .create_material(&MaterialSpec::new("MS Flat 25x5", FormulaKind::LengthBased).with_weight_per_meter(0.98))
//!     .unwrap();
//!
//! let leaf = repo.resolve_leaf(&Selection::material(&id)).unwrap();
//! assert_eq!(leaf.display_name(), "MS Flat 25x5");
//! ```

use tracing::{debug, info, warn};

use super::leaf::{LeafNode, Selection};
use super::model::{
    material_from_document, material_shape, sub_variant_from_document, variant_from_document, CatalogEntry,
    FormulaKind, Material, MaterialSpec, MaterialSummary, NodePatch, SubVariant, SubVariantSpec, ValidVariant,
    Variant, VariantEntry, VariantSpec,
};
use crate::errors::{CalcError, CalcResult};
use crate::store::{CollectionPath, Document, DocumentStore};

/// Outcome of a sequence of independent writes.
#[derive(Debug, Default)]
struct WriteTally {
    written: usize,
    failed: usize,
    first_error: Option<CalcError>,
}

impl WriteTally {
    fn record<T>(&mut self, result: CalcResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.written += 1;
                Some(value)
            }
            Err(e) => {
                self.failed += 1;
                self.first_error.get_or_insert(e);
                None
            }
        }
    }

    /// Count children that were never attempted because their parent failed.
    fn skip(&mut self, count: usize) {
        self.failed += count;
    }
}

/// Keep a decoded node, or log and drop it.
fn readable<T>(collection: &CollectionPath, id: &str, decoded: CalcResult<T>) -> Option<T> {
    match decoded {
        Ok(node) => Some(node),
        Err(error) => {
            warn!(%collection, id, error = %error, "skipping unreadable document");
            None
        }
    }
}

/// Material hierarchy over a document store.
#[derive(Debug)]
pub struct CatalogRepository<S> {
    store: S,
}

impl<S: DocumentStore> CatalogRepository<S> {
    /// Wrap a store handle
    pub fn new(store: S) -> Self {
        CatalogRepository { store }
    }

    /// Borrow the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store handle back
    pub fn into_inner(self) -> S {
        self.store
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// All materials in store order.
    pub fn list_materials(&self) -> CalcResult<Vec<MaterialSummary>> {
        self.store
            .list(&CollectionPath::materials())?
            .iter()
            .map(|(id, doc)| material_from_document(id, doc).map(|m| m.summary()))
            .collect()
    }

    /// One material, with its coefficient when it is a leaf.
    pub fn get_material(&self, id: &str) -> CalcResult<Material> {
        let doc = self.store.get(&CollectionPath::materials(), id)?;
        material_from_document(id, &doc)
    }

    /// Variants of a material. Empty for a material without variants.
    pub fn list_variants(&self, material_id: &str) -> CalcResult<Vec<Variant>> {
        let material = self.get_material(material_id)?;
        self.variants_of(&material)
    }

    /// One variant of a material.
    pub fn get_variant(&self, material_id: &str, variant_id: &str) -> CalcResult<Variant> {
        let material = self.get_material(material_id)?;
        self.variant_of(&material, variant_id)
    }

    /// Sub-variants of a variant. Empty when the material has no sub-variants.
    ///
    /// `NotFound` if either the material or the variant is missing.
    pub fn list_sub_variants(&self, material_id: &str, variant_id: &str) -> CalcResult<Vec<SubVariant>> {
        let material = self.get_material(material_id)?;
        if !material.has_variants() {
            return Err(CalcError::not_found(
                CollectionPath::variants(material_id).as_str(),
                variant_id,
            ));
        }
        self.variant_of(&material, variant_id)?;
        self.sub_variants_of(&material, variant_id)
    }

    /// One sub-variant.
    pub fn get_sub_variant(&self, material_id: &str, variant_id: &str, sub_variant_id: &str) -> CalcResult<SubVariant> {
        let material = self.get_material(material_id)?;
        let collection = CollectionPath::sub_variants(material_id, variant_id);
        if !material.has_sub_variants() {
            return Err(CalcError::not_found(collection.as_str(), sub_variant_id));
        }
        let doc = self.store.get(&collection, sub_variant_id)?;
        sub_variant_from_document(&material, variant_id, sub_variant_id, &doc)
    }

    /// The whole catalog as a tree, material by material.
    ///
    /// Documents that fail to decode are left out of the tree and logged;
    /// store failures still abort the load.
    pub fn load_catalog(&self) -> CalcResult<Vec<CatalogEntry>> {
        let root = CollectionPath::materials();
        let materials = self.store.list(&root)?;
        let mut catalog = Vec::with_capacity(materials.len());

        for (id, doc) in &materials {
            let Some(material) = readable(&root, id, material_from_document(id, doc)) else {
                continue;
            };
            let mut variants = Vec::new();
            if material.has_variants() {
                let collection = CollectionPath::variants(&material.id);
                for (vid, vdoc) in self.store.list(&collection)? {
                    let Some(variant) = readable(&collection, &vid, variant_from_document(&material, &vid, &vdoc))
                    else {
                        continue;
                    };
                    let mut sub_variants = Vec::new();
                    if material.has_sub_variants() {
                        let sub_collection = CollectionPath::sub_variants(&material.id, &vid);
                        for (sid, sdoc) in self.store.list(&sub_collection)? {
                            let decoded = sub_variant_from_document(&material, &vid, &sid, &sdoc);
                            sub_variants.extend(readable(&sub_collection, &sid, decoded));
                        }
                    }
                    variants.push(VariantEntry { variant, sub_variants });
                }
            }
            catalog.push(CatalogEntry { material, variants });
        }

        debug!(materials = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Walk a selection down to its leaf.
    ///
    /// The selection must stop exactly at the leaf: a missing variant or
    /// sub-variant id, or one given where the hierarchy has no such level,
    /// is a validation error.
    pub fn resolve_leaf(&self, selection: &Selection) -> CalcResult<LeafNode> {
        let material = self.get_material(&selection.material_id)?;

        if !material.has_variants() {
            if selection.variant_id.is_some() || selection.sub_variant_id.is_some() {
                return Err(CalcError::validation(
                    "variant_id",
                    format!("Material '{}' has no variants", material.name),
                ));
            }
            return LeafNode::from_material(&material);
        }

        let variant_id = selection.variant_id.as_deref().ok_or_else(|| {
            CalcError::validation("variant_id", format!("Material '{}' needs a variant", material.name))
        })?;
        let variant = self.variant_of(&material, variant_id)?;

        if !material.has_sub_variants() {
            if selection.sub_variant_id.is_some() {
                return Err(CalcError::validation(
                    "sub_variant_id",
                    format!("Material '{}' has no sub-variants", material.name),
                ));
            }
            return LeafNode::from_variant(&material, &variant);
        }

        let sub_variant_id = selection.sub_variant_id.as_deref().ok_or_else(|| {
            CalcError::validation("sub_variant_id", format!("Variant '{}' needs a sub-variant", variant.name))
        })?;
        let doc = self
            .store
            .get(&CollectionPath::sub_variants(&material.id, variant_id), sub_variant_id)?;
        let sub_variant = sub_variant_from_document(&material, variant_id, sub_variant_id, &doc)?;
        LeafNode::from_sub_variant(&material, &variant, &sub_variant)
    }

    fn variants_of(&self, material: &Material) -> CalcResult<Vec<Variant>> {
        if !material.has_variants() {
            return Ok(Vec::new());
        }
        self.store
            .list(&CollectionPath::variants(&material.id))?
            .iter()
            .map(|(id, doc)| variant_from_document(material, id, doc))
            .collect()
    }

    fn variant_of(&self, material: &Material, variant_id: &str) -> CalcResult<Variant> {
        let collection = CollectionPath::variants(&material.id);
        if !material.has_variants() {
            return Err(CalcError::not_found(collection.as_str(), variant_id));
        }
        let doc = self.store.get(&collection, variant_id)?;
        variant_from_document(material, variant_id, &doc)
    }

    fn sub_variants_of(&self, material: &Material, variant_id: &str) -> CalcResult<Vec<SubVariant>> {
        if !material.has_sub_variants() {
            return Ok(Vec::new());
        }
        self.store
            .list(&CollectionPath::sub_variants(&material.id, variant_id))?
            .iter()
            .map(|(id, doc)| sub_variant_from_document(material, variant_id, id, doc))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------------

    /// Create a material and every variant and sub-variant in the spec.
    ///
    /// Returns the new material id. Not atomic, see the module docs: on a
    /// failed child write the error is returned after all remaining writes
    /// have been attempted, and the successful writes stay in the store.
    pub fn create_material(&mut self, spec: &MaterialSpec) -> CalcResult<String> {
        let valid = spec.validate()?;
        let material_id = self.store.put(&CollectionPath::materials(), None, valid.document())?;

        let mut tally = WriteTally {
            written: 1,
            ..Default::default()
        };
        for variant in &valid.variants {
            self.write_variant(&material_id, variant, &mut tally);
        }

        if let Some(error) = tally.first_error {
            warn!(
                material_id = %material_id,
                written = tally.written,
                failed = tally.failed,
                error = %error,
                "material partially created; successful writes were kept"
            );
            return Err(error);
        }

        info!(
            material_id = %material_id,
            name = %valid.name,
            documents = tally.written,
            "material created"
        );
        Ok(material_id)
    }

    /// Add a variant to an existing material with variants.
    ///
    /// Sub-variants in the spec are optional here; more can be added later
    /// with [`add_sub_variant`](Self::add_sub_variant).
    pub fn add_variant(&mut self, material_id: &str, spec: &VariantSpec) -> CalcResult<String> {
        let material = self.get_material(material_id)?;
        if !material.has_variants() {
            return Err(CalcError::validation(
                "material_id",
                format!("Material '{}' does not have variants", material.name),
            ));
        }
        let valid = spec.validate(material.formula_kind, material.has_sub_variants(), false, "variant")?;

        let mut tally = WriteTally::default();
        let variant_id = self.write_variant(material_id, &valid, &mut tally);

        match (tally.first_error, variant_id) {
            (Some(error), Some(variant_id)) => {
                warn!(
                    material_id,
                    variant_id = %variant_id,
                    failed = tally.failed,
                    "variant partially created; successful writes were kept"
                );
                Err(error)
            }
            (Some(error), None) => Err(error),
            (None, Some(variant_id)) => {
                info!(material_id, variant_id = %variant_id, name = %valid.name, "variant added");
                Ok(variant_id)
            }
            (None, None) => Err(CalcError::internal("variant write produced no id and no error")),
        }
    }

    /// Add a sub-variant to an existing variant.
    pub fn add_sub_variant(&mut self, material_id: &str, variant_id: &str, spec: &SubVariantSpec) -> CalcResult<String> {
        let material = self.get_material(material_id)?;
        if !material.has_sub_variants() {
            return Err(CalcError::validation(
                "material_id",
                format!("Material '{}' does not have sub-variants", material.name),
            ));
        }
        self.variant_of(&material, variant_id)?;
        let valid = spec.validate(material.formula_kind, "sub_variant")?;

        let id = self.store.put(
            &CollectionPath::sub_variants(material_id, variant_id),
            None,
            valid.document(),
        )?;
        info!(material_id, variant_id, sub_variant_id = %id, name = %valid.name, "sub-variant added");
        Ok(id)
    }

    /// Write one variant and its sub-variants, tallying each write.
    fn write_variant(&mut self, material_id: &str, variant: &ValidVariant, tally: &mut WriteTally) -> Option<String> {
        let result = self
            .store
            .put(&CollectionPath::variants(material_id), None, variant.document());
        let Some(variant_id) = tally.record(result) else {
            tally.skip(variant.sub_variants.len());
            return None;
        };

        let collection = CollectionPath::sub_variants(material_id, &variant_id);
        for sub_variant in &variant.sub_variants {
            let result = self.store.put(&collection, None, sub_variant.document());
            tally.record(result);
        }
        Some(variant_id)
    }

    // ------------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------------

    /// Rename a material and/or change its coefficient (leaf materials only).
    pub fn update_material(&mut self, id: &str, patch: &NodePatch) -> CalcResult<Material> {
        let collection = CollectionPath::materials();
        let (kind, has_variants, _) = material_shape(id, &self.store.get(&collection, id)?)?;
        let material = self.patch_node(&collection, id, kind, !has_variants, patch, |doc| {
            material_from_document(id, doc)
        })?;
        info!(material_id = id, "material updated");
        Ok(material)
    }

    /// Rename a variant and/or change its coefficient (leaf variants only).
    pub fn update_variant(&mut self, material_id: &str, variant_id: &str, patch: &NodePatch) -> CalcResult<Variant> {
        let material = self.get_material(material_id)?;
        let collection = CollectionPath::variants(material_id);
        if !material.has_variants() {
            return Err(CalcError::not_found(collection.as_str(), variant_id));
        }
        let is_leaf = !material.has_sub_variants();
        let variant = self.patch_node(&collection, variant_id, material.formula_kind, is_leaf, patch, |doc| {
            variant_from_document(&material, variant_id, doc)
        })?;
        info!(material_id, variant_id, "variant updated");
        Ok(variant)
    }

    /// Rename a sub-variant and/or change its coefficient.
    pub fn update_sub_variant(
        &mut self,
        material_id: &str,
        variant_id: &str,
        sub_variant_id: &str,
        patch: &NodePatch,
    ) -> CalcResult<SubVariant> {
        let material = self.get_material(material_id)?;
        let collection = CollectionPath::sub_variants(material_id, variant_id);
        if !material.has_sub_variants() {
            return Err(CalcError::not_found(collection.as_str(), sub_variant_id));
        }
        let sub_variant = self.patch_node(&collection, sub_variant_id, material.formula_kind, true, patch, |doc| {
            sub_variant_from_document(&material, variant_id, sub_variant_id, doc)
        })?;
        info!(material_id, variant_id, sub_variant_id, "sub-variant updated");
        Ok(sub_variant)
    }

    /// Apply a patch to the stored document and write it back whole.
    ///
    /// Works from the raw document, so a node that no longer decodes can be
    /// repaired. Setting a coefficient drops the other kind's field. The
    /// patched document must decode before anything is written.
    fn patch_node<T>(
        &mut self,
        collection: &CollectionPath,
        id: &str,
        kind: FormulaKind,
        is_leaf: bool,
        patch: &NodePatch,
        decode: impl FnOnce(&Document) -> CalcResult<T>,
    ) -> CalcResult<T> {
        let mut doc = self.store.get(collection, id)?;
        let changes = patch.to_document(kind, is_leaf)?;

        if changes.contains_key(kind.coefficient_field()) {
            for other in [FormulaKind::LengthBased, FormulaKind::VolumeBased] {
                if other != kind {
                    doc.remove(other.coefficient_field());
                }
            }
        }
        doc.extend(changes);

        let node = decode(&doc)?;
        self.store.put(collection, Some(id), doc)?;
        Ok(node)
    }

    // ------------------------------------------------------------------------
    // Deletes
    // ------------------------------------------------------------------------

    /// Delete a material with all of its variants and sub-variants.
    ///
    /// `NotFound` if the material is already gone.
    pub fn delete_material(&mut self, id: &str) -> CalcResult<()> {
        self.store.get(&CollectionPath::materials(), id)?;

        // Clears whatever the store holds, flags notwithstanding
        let variants = self.store.list(&CollectionPath::variants(id))?;
        for (variant_id, _) in &variants {
            self.purge_variant(id, variant_id)?;
        }
        self.store.delete(&CollectionPath::materials(), id)?;

        info!(material_id = id, variants = variants.len(), "material deleted");
        Ok(())
    }

    /// Delete a variant with its sub-variants.
    pub fn delete_variant(&mut self, material_id: &str, variant_id: &str) -> CalcResult<()> {
        let material = self.get_material(material_id)?;
        let collection = CollectionPath::variants(material_id);
        if !material.has_variants() {
            return Err(CalcError::not_found(collection.as_str(), variant_id));
        }
        self.store.get(&collection, variant_id)?;
        self.purge_variant(material_id, variant_id)?;
        info!(material_id, variant_id, "variant deleted");
        Ok(())
    }

    /// Delete one sub-variant.
    pub fn delete_sub_variant(&mut self, material_id: &str, variant_id: &str, sub_variant_id: &str) -> CalcResult<()> {
        let material = self.get_material(material_id)?;
        let collection = CollectionPath::sub_variants(material_id, variant_id);
        if !material.has_sub_variants() {
            return Err(CalcError::not_found(collection.as_str(), sub_variant_id));
        }
        self.store.delete(&collection, sub_variant_id)?;
        info!(material_id, variant_id, sub_variant_id, "sub-variant deleted");
        Ok(())
    }

    fn purge_variant(&mut self, material_id: &str, variant_id: &str) -> CalcResult<()> {
        let collection = CollectionPath::sub_variants(material_id, variant_id);
        for (sub_variant_id, _) in self.store.list(&collection)? {
            self.store.delete(&collection, &sub_variant_id)?;
        }
        self.store.delete(&CollectionPath::variants(material_id), variant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::FormulaKind;
    use crate::store::{Document, MemoryStore};

    /// Store wrapper that fails every `put` into collections whose path
    /// contains `poison`.
    struct FailingStore {
        inner: MemoryStore,
        poison: &'static str,
    }

    impl DocumentStore for FailingStore {
        fn get(&self, collection: &CollectionPath, id: &str) -> CalcResult<Document> {
            self.inner.get(collection, id)
        }

        fn list(&self, collection: &CollectionPath) -> CalcResult<Vec<(String, Document)>> {
            self.inner.list(collection)
        }

        fn put(&mut self, collection: &CollectionPath, id: Option<&str>, document: Document) -> CalcResult<String> {
            if collection.as_str().contains(self.poison) {
                return Err(CalcError::io("put", collection.as_str(), "simulated timeout"));
            }
            self.inner.put(collection, id, document)
        }

        fn update(&mut self, collection: &CollectionPath, id: &str, partial: Document) -> CalcResult<()> {
            self.inner.update(collection, id, partial)
        }

        fn delete(&mut self, collection: &CollectionPath, id: &str) -> CalcResult<()> {
            self.inner.delete(collection, id)
        }
    }

    fn repo() -> CatalogRepository<MemoryStore> {
        CatalogRepository::new(MemoryStore::new())
    }

    fn flat_bar() -> MaterialSpec {
        MaterialSpec::new("MS Flat", FormulaKind::LengthBased).with_weight_per_meter(2.5)
    }

    fn plate_with_grades() -> MaterialSpec {
        MaterialSpec::new("Plate", FormulaKind::VolumeBased)
            .with_variant(VariantSpec::new("Mild Steel").with_density(7.85))
            .with_variant(VariantSpec::new("Aluminium").with_density(2.7))
    }

    fn pipe_with_schedules() -> MaterialSpec {
        MaterialSpec::new("Pipe", FormulaKind::LengthBased)
            .with_sub_variants()
            .with_variant(
                VariantSpec::new("25 NB")
                    .with_sub_variant(SubVariantSpec::new("Light").with_weight_per_meter(1.98))
                    .with_sub_variant(SubVariantSpec::new("Heavy").with_weight_per_meter(2.93)),
            )
            .with_variant(VariantSpec::new("50 NB").with_sub_variant(SubVariantSpec::new("Medium").with_weight_per_meter(5.1)))
    }

    #[test]
    fn test_create_and_get_leaf_material() {
        let mut repo = repo();
        let id = repo.create_material(&flat_bar()).unwrap();

        let material = repo.get_material(&id).unwrap();
        assert_eq!(material.name, "MS Flat");
        assert_eq!(material.coefficient().unwrap().value(), 2.5);
        assert_eq!(repo.get_material(&id).unwrap(), material);
    }

    #[test]
    fn test_list_materials_summaries() {
        let mut repo = repo();
        repo.create_material(&flat_bar()).unwrap();
        repo.create_material(&pipe_with_schedules()).unwrap();

        let list = repo.list_materials().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "MS Flat");
        assert!(!list[0].has_variants);
        assert!(list[1].has_variants && list[1].has_sub_variants);
    }

    #[test]
    fn test_list_variants_of_leaf_is_empty() {
        let mut repo = repo();
        let id = repo.create_material(&flat_bar()).unwrap();
        assert!(repo.list_variants(&id).unwrap().is_empty());
        assert!(repo.list_variants("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_nested_creation_writes_all_documents() {
        let mut repo = repo();
        let id = repo.create_material(&pipe_with_schedules()).unwrap();

        let variants = repo.list_variants(&id).unwrap();
        assert_eq!(variants.len(), 2);
        assert!(variants.iter().all(|v| v.coefficient.is_none()));

        let subs = repo.list_sub_variants(&id, &variants[0].id).unwrap();
        let names: Vec<&str> = subs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Light", "Heavy"]);
        assert_eq!(repo.store().document_count(), 6);
    }

    #[test]
    fn test_sub_variants_empty_without_sub_level() {
        let mut repo = repo();
        let id = repo.create_material(&plate_with_grades()).unwrap();
        let variant = &repo.list_variants(&id).unwrap()[0];
        assert!(repo.list_sub_variants(&id, &variant.id).unwrap().is_empty());
        assert!(repo.list_sub_variants(&id, "nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_invalid_spec_writes_nothing() {
        let mut repo = repo();
        let spec = MaterialSpec::new("Plate", FormulaKind::VolumeBased);
        assert_eq!(repo.create_material(&spec).unwrap_err().error_code(), "VALIDATION_ERROR");
        assert_eq!(repo.store().document_count(), 0);
    }

    #[test]
    fn test_partial_creation_is_visible() {
        let mut repo = CatalogRepository::new(FailingStore {
            inner: MemoryStore::new(),
            poison: "subVariants",
        });
        let err = repo.create_material(&pipe_with_schedules()).unwrap_err();
        assert!(err.is_io());

        // Material and both variants were written; every sub-variant failed
        let store = repo.into_inner().inner;
        assert_eq!(store.document_count(), 3);
    }

    #[test]
    fn test_failed_variant_writes_keep_material() {
        let mut repo = CatalogRepository::new(FailingStore {
            inner: MemoryStore::new(),
            poison: "/variants",
        });
        let err = repo.create_material(&plate_with_grades()).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");

        let repo = CatalogRepository::new(repo.into_inner().inner);
        let materials = repo.list_materials().unwrap();
        assert_eq!(materials.len(), 1);
        assert!(repo.list_variants(&materials[0].id).unwrap().is_empty());
    }

    #[test]
    fn test_add_variant_and_sub_variant() {
        let mut repo = repo();
        let id = repo.create_material(&pipe_with_schedules()).unwrap();

        let vid = repo.add_variant(&id, &VariantSpec::new("80 NB")).unwrap();
        assert!(repo.list_sub_variants(&id, &vid).unwrap().is_empty());

        let sid = repo
            .add_sub_variant(&id, &vid, &SubVariantSpec::new("Heavy").with_weight_per_meter(9.1))
            .unwrap();
        assert_eq!(repo.get_sub_variant(&id, &vid, &sid).unwrap().name, "Heavy");
    }

    #[test]
    fn test_add_variant_to_leaf_rejected() {
        let mut repo = repo();
        let id = repo.create_material(&flat_bar()).unwrap();
        let err = repo
            .add_variant(&id, &VariantSpec::new("x").with_weight_per_meter(1.0))
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_add_sub_variant_without_sub_level_rejected() {
        let mut repo = repo();
        let id = repo.create_material(&plate_with_grades()).unwrap();
        let vid = repo.list_variants(&id).unwrap()[0].id.clone();
        let err = repo
            .add_sub_variant(&id, &vid, &SubVariantSpec::new("x").with_density(1.0))
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_update_material_name_and_coefficient() {
        let mut repo = repo();
        let id = repo.create_material(&flat_bar()).unwrap();

        let updated = repo
            .update_material(&id, &NodePatch::rename("MS Flat 40x6").with_weight_per_meter(1.88))
            .unwrap();
        assert_eq!(updated.name, "MS Flat 40x6");
        assert_eq!(updated.coefficient().unwrap().value(), 1.88);
    }

    #[test]
    fn test_update_rejects_wrong_coefficient_kind() {
        let mut repo = repo();
        let id = repo.create_material(&flat_bar()).unwrap();
        let err = repo
            .update_material(&id, &NodePatch::default().with_density(7.85))
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(repo.get_material(&id).unwrap().coefficient().unwrap().value(), 2.5);
    }

    #[test]
    fn test_update_non_leaf_coefficient_rejected() {
        let mut repo = repo();
        let id = repo.create_material(&pipe_with_schedules()).unwrap();
        let vid = repo.list_variants(&id).unwrap()[0].id.clone();

        assert!(repo.update_material(&id, &NodePatch::default().with_weight_per_meter(1.0)).is_err());
        assert!(repo.update_variant(&id, &vid, &NodePatch::default().with_weight_per_meter(1.0)).is_err());
        assert_eq!(repo.update_variant(&id, &vid, &NodePatch::rename("32 NB")).unwrap().name, "32 NB");
    }

    #[test]
    fn test_update_variant_and_sub_variant() {
        let mut repo = repo();
        let plate = repo.create_material(&plate_with_grades()).unwrap();
        let vid = repo.list_variants(&plate).unwrap()[1].id.clone();
        let variant = repo
            .update_variant(&plate, &vid, &NodePatch::default().with_density(2.71))
            .unwrap();
        assert_eq!(variant.coefficient.unwrap().value(), 2.71);

        let pipe = repo.create_material(&pipe_with_schedules()).unwrap();
        let pvid = repo.list_variants(&pipe).unwrap()[0].id.clone();
        let sid = repo.list_sub_variants(&pipe, &pvid).unwrap()[0].id.clone();
        let sub = repo
            .update_sub_variant(&pipe, &pvid, &sid, &NodePatch::rename("Light (B)").with_weight_per_meter(2.0))
            .unwrap();
        assert_eq!(sub.name, "Light (B)");
        assert_eq!(sub.coefficient.value(), 2.0);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut repo = repo();
        assert!(repo.update_material("nope", &NodePatch::rename("x")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_material_cascades() {
        let mut repo = repo();
        let keep = repo.create_material(&flat_bar()).unwrap();
        let id = repo.create_material(&pipe_with_schedules()).unwrap();
        let vid = repo.list_variants(&id).unwrap()[0].id.clone();

        repo.delete_material(&id).unwrap();

        assert_eq!(repo.store().document_count(), 1);
        assert!(repo.get_material(&keep).is_ok());
        assert!(repo.list_variants(&id).unwrap_err().is_not_found());
        assert!(repo.list_sub_variants(&id, &vid).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_is_not_idempotent() {
        let mut repo = repo();
        let id = repo.create_material(&flat_bar()).unwrap();
        repo.delete_material(&id).unwrap();
        assert!(repo.delete_material(&id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_variant_cascades() {
        let mut repo = repo();
        let id = repo.create_material(&pipe_with_schedules()).unwrap();
        let vid = repo.list_variants(&id).unwrap()[0].id.clone();

        repo.delete_variant(&id, &vid).unwrap();

        assert_eq!(repo.list_variants(&id).unwrap().len(), 1);
        assert!(repo.list_sub_variants(&id, &vid).unwrap_err().is_not_found());
        assert!(!repo.store().has_documents(&CollectionPath::sub_variants(&id, &vid)));
        assert!(repo.delete_variant(&id, &vid).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_sub_variant() {
        let mut repo = repo();
        let id = repo.create_material(&pipe_with_schedules()).unwrap();
        let vid = repo.list_variants(&id).unwrap()[0].id.clone();
        let sid = repo.list_sub_variants(&id, &vid).unwrap()[0].id.clone();

        repo.delete_sub_variant(&id, &vid, &sid).unwrap();
        assert_eq!(repo.list_sub_variants(&id, &vid).unwrap().len(), 1);
        assert!(repo.delete_sub_variant(&id, &vid, &sid).unwrap_err().is_not_found());
    }

    #[test]
    fn test_load_catalog_tree() {
        let mut repo = repo();
        repo.create_material(&flat_bar()).unwrap();
        repo.create_material(&pipe_with_schedules()).unwrap();

        let catalog = repo.load_catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog[0].variants.is_empty());
        assert_eq!(catalog[1].variants.len(), 2);
        assert_eq!(catalog[1].variants[0].sub_variants.len(), 2);
        assert_eq!(catalog[1].variants[1].sub_variants[0].name, "Medium");
    }

    #[test]
    fn test_resolve_leaf_at_each_level() {
        let mut repo = repo();
        let flat = repo.create_material(&flat_bar()).unwrap();
        let plate = repo.create_material(&plate_with_grades()).unwrap();
        let pipe = repo.create_material(&pipe_with_schedules()).unwrap();

        let leaf = repo.resolve_leaf(&Selection::material(&flat)).unwrap();
        assert_eq!(leaf.formula_kind, FormulaKind::LengthBased);

        let alu = repo.list_variants(&plate).unwrap()[1].id.clone();
        let leaf = repo.resolve_leaf(&Selection::material(&plate).variant(&alu)).unwrap();
        assert_eq!(leaf.display_name(), "Plate / Aluminium");
        assert_eq!(leaf.coefficient.value(), 2.7);

        let nb25 = repo.list_variants(&pipe).unwrap()[0].id.clone();
        let heavy = repo.list_sub_variants(&pipe, &nb25).unwrap()[1].id.clone();
        let leaf = repo
            .resolve_leaf(&Selection::material(&pipe).variant(&nb25).sub_variant(&heavy))
            .unwrap();
        assert_eq!(leaf.display_name(), "Pipe / 25 NB / Heavy");
    }

    #[test]
    fn test_resolve_leaf_requires_exact_depth() {
        let mut repo = repo();
        let flat = repo.create_material(&flat_bar()).unwrap();
        let pipe = repo.create_material(&pipe_with_schedules()).unwrap();
        let nb25 = repo.list_variants(&pipe).unwrap()[0].id.clone();

        assert!(repo.resolve_leaf(&Selection::material(&flat).variant("x")).is_err());
        assert!(repo.resolve_leaf(&Selection::material(&pipe)).is_err());
        assert!(repo.resolve_leaf(&Selection::material(&pipe).variant(&nb25)).is_err());
        assert!(repo
            .resolve_leaf(&Selection::material(&pipe).variant(&nb25).sub_variant("gone"))
            .unwrap_err()
            .is_not_found());
    }

    fn plate_with_thicknesses() -> MaterialSpec {
        MaterialSpec::new("Plate", FormulaKind::VolumeBased)
            .with_sub_variants()
            .with_variant(VariantSpec::new("IS 2062").with_sub_variant(SubVariantSpec::new("6 mm").with_density(7.85)))
    }

    fn legacy_sub_variant(name: &str) -> Document {
        // Older catalogs stored weightPerMeter on every sub-variant
        let mut doc = Document::new();
        doc.insert("name".into(), serde_json::json!(name));
        doc.insert("weightPerMeter".into(), serde_json::json!(1.0));
        doc
    }

    /// Catalog with one readable and one legacy sub-variant under the same variant.
    fn seeded_with_legacy() -> (CatalogRepository<MemoryStore>, String, String, String) {
        let mut repo = repo();
        let id = repo.create_material(&plate_with_thicknesses()).unwrap();
        let vid = repo.list_variants(&id).unwrap()[0].id.clone();

        let mut store = repo.into_inner();
        let legacy = store
            .put(&CollectionPath::sub_variants(&id, &vid), None, legacy_sub_variant("8 mm"))
            .unwrap();
        (CatalogRepository::new(store), id, vid, legacy)
    }

    #[test]
    fn test_load_catalog_skips_unreadable_sub_variant() {
        let (repo, id, vid, legacy) = seeded_with_legacy();

        let catalog = repo.load_catalog().unwrap();
        let subs = &catalog[0].variants[0].sub_variants;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].name, "6 mm");

        let err = repo.get_sub_variant(&id, &vid, &legacy).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_legacy_sub_variant_repaired_by_update() {
        let (mut repo, id, vid, legacy) = seeded_with_legacy();
        let collection = CollectionPath::sub_variants(&id, &vid);

        // A rename alone cannot make it readable, and writes nothing
        let err = repo
            .update_sub_variant(&id, &vid, &legacy, &NodePatch::rename("8 mm plate"))
            .unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
        assert_eq!(repo.store().get(&collection, &legacy).unwrap()["name"], "8 mm");

        let repaired = repo
            .update_sub_variant(&id, &vid, &legacy, &NodePatch::default().with_density(7.93))
            .unwrap();
        assert_eq!(repaired.coefficient.value(), 7.93);
        assert_eq!(repaired.name, "8 mm");

        let stored = repo.store().get(&collection, &legacy).unwrap();
        assert!(!stored.contains_key("weightPerMeter"));
        assert_eq!(repo.load_catalog().unwrap()[0].variants[0].sub_variants.len(), 2);
    }

    #[test]
    fn test_legacy_sub_variant_can_be_deleted() {
        let (mut repo, id, vid, legacy) = seeded_with_legacy();

        repo.delete_sub_variant(&id, &vid, &legacy).unwrap();
        assert_eq!(repo.list_sub_variants(&id, &vid).unwrap().len(), 1);
        assert!(repo.delete_sub_variant(&id, &vid, &legacy).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unreadable_leaf_material_repair_and_delete() {
        let mut doc = Document::new();
        doc.insert("name".into(), serde_json::json!("Brass Sheet"));
        doc.insert("type".into(), serde_json::json!("volume-based"));
        doc.insert("hasSubMaterials".into(), serde_json::json!(false));
        doc.insert("weightPerMeter".into(), serde_json::json!(3.0));

        let mut store = MemoryStore::new();
        let first = store.put(&CollectionPath::materials(), None, doc.clone()).unwrap();
        let second = store.put(&CollectionPath::materials(), None, doc).unwrap();
        let mut repo = CatalogRepository::new(store);

        assert!(repo.load_catalog().unwrap().is_empty());

        let material = repo
            .update_material(&first, &NodePatch::default().with_density(8.5))
            .unwrap();
        assert_eq!(material.coefficient().unwrap().value(), 8.5);

        repo.delete_material(&second).unwrap();
        let catalog = repo.load_catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].material.id, first);
    }
}
