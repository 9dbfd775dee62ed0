//! End-to-end catalog workflows: build a catalog, pick a leaf, calculate.

use calc_core::calculations::{calculate, calculate_raw, RawWeightInput, WeightInput};
use calc_core::catalog::{
    CatalogRepository, FormulaKind, MaterialSpec, NodePatch, Selection, SubVariantSpec, VariantSpec,
};
use calc_core::store::{CollectionPath, DocumentStore, JsonFileStore, MemoryStore};
use calc_core::CalcError;
use tempfile::TempDir;

fn pipe_spec() -> MaterialSpec {
    MaterialSpec::new("GI Pipe", FormulaKind::LengthBased)
        .with_sub_variants()
        .with_variant(
            VariantSpec::new("25 NB")
                .with_sub_variant(SubVariantSpec::new("Light").with_weight_per_meter(1.98))
                .with_sub_variant(SubVariantSpec::new("Medium").with_weight_per_meter(2.41)),
        )
        .with_variant(
            VariantSpec::new("40 NB").with_sub_variant(SubVariantSpec::new("Heavy").with_weight_per_meter(4.37)),
        )
}

fn seed<S: DocumentStore>(repo: &mut CatalogRepository<S>) -> (String, String) {
    let flat = repo
        .create_material(&MaterialSpec::new("MS Flat 25x5", FormulaKind::LengthBased).with_weight_per_meter(2.5))
        .unwrap();
    let pipe = repo.create_material(&pipe_spec()).unwrap();
    (flat, pipe)
}

#[test]
fn test_leaf_material_to_cost() {
    let mut repo = CatalogRepository::new(MemoryStore::new());
    let (flat, _) = seed(&mut repo);

    let leaf = repo.resolve_leaf(&Selection::material(&flat)).unwrap();
    let result = calculate(&leaf, &WeightInput::new(100.0).with_length_m(4.0).with_quantity(3)).unwrap();

    assert!((result.total_weight_kg - 30.0).abs() < 1e-9);
    assert!((result.total_cost - 3000.0).abs() < 1e-9);
    assert_eq!(result.leaf_name, "MS Flat 25x5");
}

#[test]
fn test_sub_variant_selection_walk() {
    let mut repo = CatalogRepository::new(MemoryStore::new());
    let (_, pipe) = seed(&mut repo);

    let variants = repo.list_variants(&pipe).unwrap();
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].name, "25 NB");
    assert!(variants.iter().all(|v| v.coefficient.is_none()));

    let subs = repo.list_sub_variants(&pipe, &variants[0].id).unwrap();
    assert_eq!(subs.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["Light", "Medium"]);

    let selection = Selection::material(&pipe).variant(&variants[0].id).sub_variant(&subs[1].id);
    let leaf = repo.resolve_leaf(&selection).unwrap();
    assert_eq!(leaf.display_name(), "GI Pipe / 25 NB / Medium");

    let raw = RawWeightInput {
        length_m: "6".into(),
        quantity: "10".into(),
        rate_per_kg: "80".into(),
        ..Default::default()
    };
    let result = calculate_raw(&leaf, &raw).unwrap();
    assert!((result.total_weight_kg - 144.6).abs() < 1e-9);
    assert!((result.total_cost - 11568.0).abs() < 1e-6);

    // Stopping above the leaf is not a valid selection
    let short = Selection::material(&pipe).variant(&variants[0].id);
    assert!(matches!(repo.resolve_leaf(&short), Err(CalcError::Validation { .. })));
}

#[test]
fn test_volume_material_with_variants() {
    let mut repo = CatalogRepository::new(MemoryStore::new());
    let id = repo
        .create_material(
            &MaterialSpec::new("MS Plate", FormulaKind::VolumeBased)
                .with_variant(VariantSpec::new("IS 2062").with_density(7.85)),
        )
        .unwrap();
    let variant = repo.list_variants(&id).unwrap().remove(0);
    let leaf = repo
        .resolve_leaf(&Selection::material(&id).variant(&variant.id))
        .unwrap();

    let input = WeightInput::new(50.0).with_length_m(1.0).with_section_mm(10.0, 5.0);
    let result = calculate(&leaf, &input).unwrap();
    assert!((result.total_weight_kg - 0.3925).abs() < 1e-9);
    assert!((result.total_cost - 19.625).abs() < 1e-9);

    // A length-only input does not satisfy a volume formula
    let err = calculate(&leaf, &WeightInput::new(50.0).with_length_m(1.0)).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");
}

#[test]
fn test_edit_then_recalculate() {
    let mut repo = CatalogRepository::new(MemoryStore::new());
    let (flat, pipe) = seed(&mut repo);

    repo.update_material(&flat, &NodePatch::default().with_weight_per_meter(3.0))
        .unwrap();
    let leaf = repo.resolve_leaf(&Selection::material(&flat)).unwrap();
    let result = calculate(&leaf, &WeightInput::new(0.0).with_length_m(2.0)).unwrap();
    assert!((result.total_weight_kg - 6.0).abs() < 1e-9);
    assert_eq!(result.total_cost, 0.0);

    // Non-leaf nodes have no coefficient to edit
    assert!(repo
        .update_material(&pipe, &NodePatch::default().with_weight_per_meter(1.0))
        .is_err());
}

#[test]
fn test_cascade_delete_leaves_nothing_behind() {
    let mut repo = CatalogRepository::new(MemoryStore::new());
    let (flat, pipe) = seed(&mut repo);
    let variants = repo.list_variants(&pipe).unwrap();

    repo.delete_material(&pipe).unwrap();

    let store = repo.store();
    assert!(!store.has_documents(&CollectionPath::variants(&pipe)));
    for v in &variants {
        assert!(!store.has_documents(&CollectionPath::sub_variants(&pipe, &v.id)));
    }
    assert_eq!(store.document_count(), 1);

    assert!(repo.get_material(&pipe).unwrap_err().is_not_found());
    assert!(repo.get_material(&flat).is_ok());
}

#[test]
fn test_file_store_persists_catalog() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");

    let pipe = {
        let store = JsonFileStore::open(&path, "workshop").unwrap();
        let mut repo = CatalogRepository::new(store);
        let (_, pipe) = seed(&mut repo);
        pipe
    };

    let repo = CatalogRepository::new(JsonFileStore::open_read_only(&path).unwrap());
    let catalog = repo.load_catalog().unwrap();
    assert_eq!(catalog.len(), 2);

    let pipe_entry = catalog.iter().find(|e| e.material.id == pipe).unwrap();
    assert_eq!(pipe_entry.variants.len(), 2);
    assert_eq!(pipe_entry.variants[0].sub_variants.len(), 2);
    assert_eq!(pipe_entry.variants[1].sub_variants[0].name, "Heavy");
}

#[test]
fn test_file_store_delete_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");

    let (flat, pipe) = {
        let mut repo = CatalogRepository::new(JsonFileStore::open(&path, "workshop").unwrap());
        let ids = seed(&mut repo);
        repo.delete_material(&ids.1).unwrap();
        ids
    };

    let repo = CatalogRepository::new(JsonFileStore::open_read_only(&path).unwrap());
    let names: Vec<_> = repo.list_materials().unwrap().into_iter().map(|m| m.id).collect();
    assert_eq!(names, vec![flat]);
    assert!(repo.list_variants(&pipe).unwrap_err().is_not_found());
}
