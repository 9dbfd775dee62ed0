//! Leaf selection and resolution.
//!
//! A [`Selection`] names a path into the catalog. Resolving it yields a
//! [`LeafNode`]: the coefficient and formula kind the calculator needs, plus
//! the names along the path for display.

use serde::{Deserialize, Serialize};

use super::model::{Coefficient, FormulaKind, Material, SubVariant, Variant};
use crate::errors::{CalcError, CalcResult};

/// Ids picked by the user, top down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub material_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_variant_id: Option<String>,
}

impl Selection {
    pub fn material(material_id: impl Into<String>) -> Self {
        Selection {
            material_id: material_id.into(),
            ..Default::default()
        }
    }

    pub fn variant(mut self, variant_id: impl Into<String>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    pub fn sub_variant(mut self, sub_variant_id: impl Into<String>) -> Self {
        self.sub_variant_id = Some(sub_variant_id.into());
        self
    }
}

/// A resolved leaf, ready for calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub selection: Selection,
    /// Names from material down to the leaf
    pub path: Vec<String>,
    /// Inherited from the material
    pub formula_kind: FormulaKind,
    pub coefficient: Coefficient,
}

impl LeafNode {
    /// Leaf for a material without variants
    pub fn from_material(material: &Material) -> CalcResult<Self> {
        let coefficient = material.coefficient().ok_or_else(|| {
            CalcError::validation(
                "variant_id",
                format!("Material '{}' has variants; select one", material.name),
            )
        })?;
        Self::build(
            Selection::material(&material.id),
            vec![material.name.clone()],
            material.formula_kind,
            coefficient,
        )
    }

    /// Leaf for a variant of a material without sub-variants
    pub fn from_variant(material: &Material, variant: &Variant) -> CalcResult<Self> {
        let coefficient = variant.coefficient.ok_or_else(|| {
            CalcError::validation(
                "sub_variant_id",
                format!("Variant '{}' has sub-variants; select one", variant.name),
            )
        })?;
        Self::build(
            Selection::material(&material.id).variant(&variant.id),
            vec![material.name.clone(), variant.name.clone()],
            material.formula_kind,
            coefficient,
        )
    }

    /// Leaf for a sub-variant
    pub fn from_sub_variant(material: &Material, variant: &Variant, sub_variant: &SubVariant) -> CalcResult<Self> {
        Self::build(
            Selection::material(&material.id)
                .variant(&variant.id)
                .sub_variant(&sub_variant.id),
            vec![material.name.clone(), variant.name.clone(), sub_variant.name.clone()],
            material.formula_kind,
            sub_variant.coefficient,
        )
    }

    fn build(
        selection: Selection,
        path: Vec<String>,
        formula_kind: FormulaKind,
        coefficient: Coefficient,
    ) -> CalcResult<Self> {
        if coefficient.formula_kind() != formula_kind {
            return Err(CalcError::internal(format!(
                "{} leaf carries a {} coefficient",
                formula_kind,
                coefficient.formula_kind()
            )));
        }
        Ok(LeafNode {
            selection,
            path,
            formula_kind,
            coefficient,
        })
    }

    /// "Material / Variant / Sub-variant"
    pub fn display_name(&self) -> String {
        self.path.join(" / ")
    }
}
