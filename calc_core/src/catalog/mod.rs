//! # Material Catalog
//!
//! The material hierarchy and the repository that stores it.
//!
//! ```text
//! Material (formula kind, hierarchy depth)
//! ├── coefficient                      when it has no variants
//! └── Variant
//!     ├── coefficient                  when it has no sub-variants
//!     └── SubVariant
//!         └── coefficient
//! ```
//!
//! - [`model`] - records, creation specs, patches
//! - [`repository`] - [`CatalogRepository`] over any document store
//! - [`leaf`] - selecting and resolving a leaf for calculation

pub mod leaf;
pub mod model;
pub mod repository;

pub use leaf::{LeafNode, Selection};
pub use model::{
    CatalogEntry, Coefficient, FormulaKind, Hierarchy, Material, MaterialSpec, MaterialSummary, NodePatch,
    SubVariant, SubVariantSpec, Variant, VariantEntry, VariantSpec,
};
pub use repository::CatalogRepository;
