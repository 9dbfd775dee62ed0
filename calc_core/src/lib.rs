//! # calc_core - Material Catalog and Weight Calculation Engine
//!
//! `calc_core` is the computational heart of Matcalc: a hierarchical catalog of
//! stock materials (material, variant, sub-variant) and a calculator that turns
//! a selected leaf plus dimensions into total weight and cost. All inputs and
//! outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Pure Calculations**: weight/cost is a function of a leaf and an input
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Pluggable Storage**: the catalog runs over any [`store::DocumentStore`]
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::catalog::{CatalogRepository, FormulaKind, MaterialSpec, Selection, VariantSpec};
//! use calc_core::calculations::{calculate, WeightInput};
//! use calc_core::store::MemoryStore;
//!
//! let mut repo = CatalogRepository::new(MemoryStore::new());
//! let spec = MaterialSpec::new("Aluminium Plate", FormulaKind::VolumeBased)
//!     .with_variant(VariantSpec::new("6061").with_density(2.7));
//! let material_id = repo.create_material(&spec).unwrap();
//!
//! let variant_id = repo.list_variants(&material_id).unwrap()[0].id.clone();
//! let leaf = repo
//!     .resolve_leaf(&Selection::material(&material_id).variant(&variant_id))
//!     .unwrap();
//!
//! let input = WeightInput::new(300.0).with_length_m(1.0).with_section_mm(100.0, 10.0);
//! let result = calculate(&leaf, &input).unwrap();
//! assert!((result.total_weight_kg - 2.7).abs() < 1e-9);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Material hierarchy, validation, and the catalog repository
//! - [`calculations`] - Weight and cost calculation
//! - [`store`] - Document store trait with in-memory and JSON-file backends
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod catalog;
pub mod errors;
pub mod store;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{calculate, WeightInput, WeightResult};
pub use catalog::{CatalogRepository, LeafNode, Selection};
pub use errors::{CalcError, CalcResult};
pub use store::{DocumentStore, MemoryStore};
#[cfg(not(target_arch = "wasm32"))]
pub use store::JsonFileStore;
