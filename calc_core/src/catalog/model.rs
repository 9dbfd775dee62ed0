//! # Catalog Data Model
//!
//! Three levels: **Material → Variant → SubVariant**. Whether a material has
//! variants, and whether those variants have sub-variants, is decided once on
//! the material and applies to every child. The node at the bottom of a
//! material's hierarchy is a *leaf* and carries exactly one [`Coefficient`],
//! whose kind is fixed by the material's [`FormulaKind`].
//!
//! Creation input ([`MaterialSpec`], [`VariantSpec`], [`SubVariantSpec`]) and
//! edits ([`NodePatch`]) are loosely shaped on purpose, since they come from
//! JSON files and command-line flags. They are checked against the hierarchy
//! rules before anything reaches the store.
//!
//! ## Stored Documents
//!
//! ```json
//! // materials/{id}
//! { "name": "MS Flat", "type": "length-based",
//!   "hasSubMaterials": false, "hasSubSubMaterials": false, "weightPerMeter": 2.5 }
//!
//! // materials/{id}/variants/{id}  (leaf variant of a volume-based material)
//! { "name": "SS 304", "density": 7.93 }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{CalcError, CalcResult};
use crate::store::{CollectionPath, Document};
use crate::units::{GramsPerCm3, KgPerMeter};

pub(crate) const FIELD_NAME: &str = "name";
pub(crate) const FIELD_TYPE: &str = "type";
pub(crate) const FIELD_HAS_VARIANTS: &str = "hasSubMaterials";
pub(crate) const FIELD_HAS_SUB_VARIANTS: &str = "hasSubSubMaterials";
pub(crate) const FIELD_WEIGHT_PER_METER: &str = "weightPerMeter";
pub(crate) const FIELD_DENSITY: &str = "density";

// ============================================================================
// Formula kind and coefficient
// ============================================================================

/// Which physical formula applies to a material's leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormulaKind {
    /// Mass per unit length (kg/m) times length
    LengthBased,
    /// Volume (cm³) times density (g/cm³)
    VolumeBased,
}

impl FormulaKind {
    /// Stored name of the formula kind
    pub fn as_str(self) -> &'static str {
        match self {
            FormulaKind::LengthBased => "length-based",
            FormulaKind::VolumeBased => "volume-based",
        }
    }

    /// Document field holding this kind's coefficient
    pub fn coefficient_field(self) -> &'static str {
        match self {
            FormulaKind::LengthBased => FIELD_WEIGHT_PER_METER,
            FormulaKind::VolumeBased => FIELD_DENSITY,
        }
    }

    /// Unit label of this kind's coefficient
    pub fn coefficient_unit(self) -> &'static str {
        match self {
            FormulaKind::LengthBased => "kg/m",
            FormulaKind::VolumeBased => "g/cm³",
        }
    }
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulaKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length-based" | "length" | "lengthbased" => Ok(FormulaKind::LengthBased),
            "volume-based" | "volume" | "volumebased" => Ok(FormulaKind::VolumeBased),
            other => Err(CalcError::validation(
                "formula_kind",
                format!("Unknown formula kind '{other}' (expected length-based or volume-based)"),
            )),
        }
    }
}

/// The single numeric property a leaf carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Coefficient {
    /// kg per meter
    LengthBased { weight_per_unit_length: KgPerMeter },
    /// g per cm³
    VolumeBased { density: GramsPerCm3 },
}

impl Coefficient {
    /// Build the coefficient for `kind`, rejecting non-finite or non-positive values.
    pub fn new(kind: FormulaKind, value: f64) -> CalcResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CalcError::validation(
                kind.coefficient_field(),
                format!("Coefficient must be a positive number, got {value}"),
            ));
        }
        Ok(match kind {
            FormulaKind::LengthBased => Coefficient::LengthBased {
                weight_per_unit_length: KgPerMeter(value),
            },
            FormulaKind::VolumeBased => Coefficient::VolumeBased {
                density: GramsPerCm3(value),
            },
        })
    }

    /// Formula kind this coefficient belongs to
    pub fn formula_kind(&self) -> FormulaKind {
        match self {
            Coefficient::LengthBased { .. } => FormulaKind::LengthBased,
            Coefficient::VolumeBased { .. } => FormulaKind::VolumeBased,
        }
    }

    /// Raw numeric value
    pub fn value(&self) -> f64 {
        match self {
            Coefficient::LengthBased { weight_per_unit_length } => weight_per_unit_length.0,
            Coefficient::VolumeBased { density } => density.0,
        }
    }

    fn write_to(&self, doc: &mut Document) {
        doc.insert(self.formula_kind().coefficient_field().to_string(), json!(self.value()));
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value(), self.formula_kind().coefficient_unit())
    }
}

// ============================================================================
// Catalog records
// ============================================================================

/// How deep a material's hierarchy goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Hierarchy {
    /// The material itself is the leaf
    Leaf { coefficient: Coefficient },
    /// Variants are the leaves
    Variants,
    /// Every variant has sub-variants, which are the leaves
    SubVariants,
}

impl Hierarchy {
    pub fn has_variants(&self) -> bool {
        !matches!(self, Hierarchy::Leaf { .. })
    }

    pub fn has_sub_variants(&self) -> bool {
        matches!(self, Hierarchy::SubVariants)
    }
}

/// Listing row for a material. No coefficient data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub id: String,
    pub name: String,
    pub formula_kind: FormulaKind,
    pub has_variants: bool,
    pub has_sub_variants: bool,
}

/// Root catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub formula_kind: FormulaKind,
    pub hierarchy: Hierarchy,
}

impl Material {
    pub fn has_variants(&self) -> bool {
        self.hierarchy.has_variants()
    }

    pub fn has_sub_variants(&self) -> bool {
        self.hierarchy.has_sub_variants()
    }

    /// Coefficient when the material is itself a leaf
    pub fn coefficient(&self) -> Option<Coefficient> {
        match self.hierarchy {
            Hierarchy::Leaf { coefficient } => Some(coefficient),
            _ => None,
        }
    }

    pub fn summary(&self) -> MaterialSummary {
        MaterialSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            formula_kind: self.formula_kind,
            has_variants: self.has_variants(),
            has_sub_variants: self.has_sub_variants(),
        }
    }
}

/// Child of a material with variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub material_id: String,
    pub name: String,
    /// Present exactly when the parent material has no sub-variants
    pub coefficient: Option<Coefficient>,
}

/// Child of a variant. Always a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubVariant {
    pub id: String,
    pub material_id: String,
    pub variant_id: String,
    pub name: String,
    pub coefficient: Coefficient,
}

/// A variant together with its sub-variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantEntry {
    pub variant: Variant,
    pub sub_variants: Vec<SubVariant>,
}

/// A material together with its whole subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub material: Material,
    pub variants: Vec<VariantEntry>,
}

// ============================================================================
// Creation specs
// ============================================================================

/// Input for creating a material, optionally with its full subtree.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "GI Pipe",
///   "formula_kind": "length-based",
///   "has_variants": true,
///   "has_sub_variants": true,
///   "variants": [
///     { "name": "25 NB", "sub_variants": [ { "name": "Medium", "weight_per_unit_length": 2.41 } ] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub name: String,
    pub formula_kind: FormulaKind,
    #[serde(default)]
    pub has_variants: bool,
    #[serde(default)]
    pub has_sub_variants: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_unit_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantSpec>,
}

impl MaterialSpec {
    /// Start a spec with no coefficient and no variants.
    pub fn new(name: impl Into<String>, formula_kind: FormulaKind) -> Self {
        MaterialSpec {
            name: name.into(),
            formula_kind,
            has_variants: false,
            has_sub_variants: false,
            weight_per_unit_length: None,
            density: None,
            variants: Vec::new(),
        }
    }

    pub fn with_weight_per_meter(mut self, kg_per_m: f64) -> Self {
        self.weight_per_unit_length = Some(kg_per_m);
        self
    }

    pub fn with_density(mut self, g_per_cm3: f64) -> Self {
        self.density = Some(g_per_cm3);
        self
    }

    /// Add a variant; marks the material as having variants.
    pub fn with_variant(mut self, variant: VariantSpec) -> Self {
        self.has_variants = true;
        self.variants.push(variant);
        self
    }

    /// Mark every variant as having sub-variants.
    pub fn with_sub_variants(mut self) -> Self {
        self.has_sub_variants = true;
        self
    }

    /// Check the spec against the hierarchy rules.
    pub(crate) fn validate(&self) -> CalcResult<ValidMaterial> {
        let name = valid_name(&self.name, "name")?;

        if self.has_sub_variants && !self.has_variants {
            return Err(CalcError::validation(
                "has_sub_variants",
                "A material cannot have sub-variants without variants",
            ));
        }

        let is_leaf = !self.has_variants;
        let coefficient = leaf_coefficient(
            self.formula_kind,
            is_leaf,
            self.weight_per_unit_length,
            self.density,
            "material",
        )?;

        let hierarchy = match coefficient {
            Some(coefficient) => Hierarchy::Leaf { coefficient },
            None if self.has_sub_variants => Hierarchy::SubVariants,
            None => Hierarchy::Variants,
        };

        if is_leaf && !self.variants.is_empty() {
            return Err(CalcError::validation(
                "variants",
                "Variants supplied for a material without variants",
            ));
        }
        if !is_leaf && self.variants.is_empty() {
            return Err(CalcError::validation(
                "variants",
                "A material with variants needs at least one variant",
            ));
        }

        let variants = self
            .variants
            .iter()
            .enumerate()
            .map(|(i, v)| v.validate(self.formula_kind, self.has_sub_variants, true, &format!("variants[{i}]")))
            .collect::<CalcResult<Vec<_>>>()?;

        Ok(ValidMaterial {
            name,
            formula_kind: self.formula_kind,
            hierarchy,
            variants,
        })
    }
}

/// Input for creating a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_unit_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_variants: Vec<SubVariantSpec>,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>) -> Self {
        VariantSpec {
            name: name.into(),
            weight_per_unit_length: None,
            density: None,
            sub_variants: Vec::new(),
        }
    }

    pub fn with_weight_per_meter(mut self, kg_per_m: f64) -> Self {
        self.weight_per_unit_length = Some(kg_per_m);
        self
    }

    pub fn with_density(mut self, g_per_cm3: f64) -> Self {
        self.density = Some(g_per_cm3);
        self
    }

    pub fn with_sub_variant(mut self, sub_variant: SubVariantSpec) -> Self {
        self.sub_variants.push(sub_variant);
        self
    }

    /// `require_children` is false when adding a variant to an existing
    /// material, where sub-variants can follow in later calls.
    pub(crate) fn validate(
        &self,
        kind: FormulaKind,
        has_sub_variants: bool,
        require_children: bool,
        field: &str,
    ) -> CalcResult<ValidVariant> {
        let name = valid_name(&self.name, &format!("{field}.name"))?;
        let coefficient = leaf_coefficient(
            kind,
            !has_sub_variants,
            self.weight_per_unit_length,
            self.density,
            field,
        )?;

        if !has_sub_variants && !self.sub_variants.is_empty() {
            return Err(CalcError::validation(
                format!("{field}.sub_variants"),
                "Sub-variants supplied for a material without sub-variants",
            ));
        }
        if has_sub_variants && require_children && self.sub_variants.is_empty() {
            return Err(CalcError::validation(
                format!("{field}.sub_variants"),
                "Each variant of this material needs at least one sub-variant",
            ));
        }

        let sub_variants = self
            .sub_variants
            .iter()
            .enumerate()
            .map(|(i, s)| s.validate(kind, &format!("{field}.sub_variants[{i}]")))
            .collect::<CalcResult<Vec<_>>>()?;

        Ok(ValidVariant {
            name,
            coefficient,
            sub_variants,
        })
    }
}

/// Input for creating a sub-variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubVariantSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_unit_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

impl SubVariantSpec {
    pub fn new(name: impl Into<String>) -> Self {
        SubVariantSpec {
            name: name.into(),
            weight_per_unit_length: None,
            density: None,
        }
    }

    pub fn with_weight_per_meter(mut self, kg_per_m: f64) -> Self {
        self.weight_per_unit_length = Some(kg_per_m);
        self
    }

    pub fn with_density(mut self, g_per_cm3: f64) -> Self {
        self.density = Some(g_per_cm3);
        self
    }

    pub(crate) fn validate(&self, kind: FormulaKind, field: &str) -> CalcResult<ValidSubVariant> {
        let name = valid_name(&self.name, &format!("{field}.name"))?;
        let coefficient = leaf_coefficient(kind, true, self.weight_per_unit_length, self.density, field)?
            .ok_or_else(|| CalcError::internal("leaf coefficient resolved to none"))?;
        Ok(ValidSubVariant { name, coefficient })
    }
}

// ============================================================================
// Validated specs (ready to write)
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct ValidMaterial {
    pub name: String,
    pub formula_kind: FormulaKind,
    pub hierarchy: Hierarchy,
    pub variants: Vec<ValidVariant>,
}

impl ValidMaterial {
    pub fn document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(FIELD_NAME.into(), json!(self.name));
        doc.insert(FIELD_TYPE.into(), json!(self.formula_kind.as_str()));
        doc.insert(FIELD_HAS_VARIANTS.into(), json!(self.hierarchy.has_variants()));
        doc.insert(FIELD_HAS_SUB_VARIANTS.into(), json!(self.hierarchy.has_sub_variants()));
        if let Hierarchy::Leaf { coefficient } = &self.hierarchy {
            coefficient.write_to(&mut doc);
        }
        doc
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ValidVariant {
    pub name: String,
    pub coefficient: Option<Coefficient>,
    pub sub_variants: Vec<ValidSubVariant>,
}

impl ValidVariant {
    pub fn document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(FIELD_NAME.into(), json!(self.name));
        if let Some(coefficient) = &self.coefficient {
            coefficient.write_to(&mut doc);
        }
        doc
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ValidSubVariant {
    pub name: String,
    pub coefficient: Coefficient,
}

impl ValidSubVariant {
    pub fn document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(FIELD_NAME.into(), json!(self.name));
        self.coefficient.write_to(&mut doc);
        doc
    }
}

fn valid_name(name: &str, field: &str) -> CalcResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CalcError::validation(field, "Name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Resolve the coefficient fields of a spec or patch.
///
/// A leaf needs exactly the field matching `kind`; a non-leaf takes neither.
fn leaf_coefficient(
    kind: FormulaKind,
    is_leaf: bool,
    weight_per_unit_length: Option<f64>,
    density: Option<f64>,
    field: &str,
) -> CalcResult<Option<Coefficient>> {
    match (is_leaf, weight_per_unit_length, density) {
        (false, None, None) => Ok(None),
        (false, _, _) => Err(CalcError::validation(
            field,
            "Only leaf nodes carry a coefficient",
        )),
        (true, Some(_), Some(_)) => Err(CalcError::validation(
            field,
            "Give either weight_per_unit_length or density, not both",
        )),
        (true, None, None) => Err(CalcError::validation(
            field,
            format!("Leaf node is missing its {} ({})", kind.coefficient_field(), kind.coefficient_unit()),
        )),
        (true, Some(value), None) => matching_coefficient(kind, FormulaKind::LengthBased, value, field),
        (true, None, Some(value)) => matching_coefficient(kind, FormulaKind::VolumeBased, value, field),
    }
}

fn matching_coefficient(
    expected: FormulaKind,
    given: FormulaKind,
    value: f64,
    field: &str,
) -> CalcResult<Option<Coefficient>> {
    if expected != given {
        return Err(CalcError::validation(
            field,
            format!(
                "A {expected} material takes {}, not {}",
                expected.coefficient_field(),
                given.coefficient_field()
            ),
        ));
    }
    Coefficient::new(expected, value).map(Some)
}

// ============================================================================
// Patches
// ============================================================================

/// Edit command for any catalog node. Only the name and the node's own
/// coefficient can change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_unit_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

impl NodePatch {
    pub fn rename(name: impl Into<String>) -> Self {
        NodePatch {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_weight_per_meter(mut self, kg_per_m: f64) -> Self {
        self.weight_per_unit_length = Some(kg_per_m);
        self
    }

    pub fn with_density(mut self, g_per_cm3: f64) -> Self {
        self.density = Some(g_per_cm3);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.weight_per_unit_length.is_none() && self.density.is_none()
    }

    /// Turn the patch into a partial document for a node of the given kind.
    pub(crate) fn to_document(&self, kind: FormulaKind, is_leaf: bool) -> CalcResult<Document> {
        if self.is_empty() {
            return Err(CalcError::validation("patch", "Nothing to update"));
        }

        let mut doc = Document::new();
        if let Some(name) = &self.name {
            doc.insert(FIELD_NAME.into(), json!(valid_name(name, "name")?));
        }

        let has_coefficient = self.weight_per_unit_length.is_some() || self.density.is_some();
        if has_coefficient {
            if !is_leaf {
                return Err(CalcError::validation("patch", "Only leaf nodes carry a coefficient"));
            }
            if let Some(coefficient) = leaf_coefficient(kind, true, self.weight_per_unit_length, self.density, "patch")? {
                coefficient.write_to(&mut doc);
            }
        }
        Ok(doc)
    }
}

// ============================================================================
// Document decoding
// ============================================================================

fn corrupt(collection: &CollectionPath, id: &str, reason: impl fmt::Display) -> CalcError {
    CalcError::SerializationError {
        reason: format!("Document {collection}/{id}: {reason}"),
    }
}

fn read_name(doc: &Document, collection: &CollectionPath, id: &str) -> CalcResult<String> {
    doc.get(FIELD_NAME)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| corrupt(collection, id, "missing 'name'"))
}

fn read_flag(doc: &Document, field: &str) -> bool {
    doc.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn read_coefficient(doc: &Document, kind: FormulaKind, collection: &CollectionPath, id: &str) -> CalcResult<Coefficient> {
    let field = kind.coefficient_field();
    let value = doc
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| corrupt(collection, id, format!("missing numeric '{field}'")))?;
    Coefficient::new(kind, value).map_err(|e| corrupt(collection, id, e))
}

/// Formula kind, `has_variants` and `has_sub_variants` of a stored material,
/// read without touching its coefficient.
pub(crate) fn material_shape(id: &str, doc: &Document) -> CalcResult<(FormulaKind, bool, bool)> {
    let formula_kind = doc
        .get(FIELD_TYPE)
        .and_then(Value::as_str)
        .ok_or_else(|| corrupt(&CollectionPath::materials(), id, "missing 'type'"))?
        .parse::<FormulaKind>()
        .map_err(|e| corrupt(&CollectionPath::materials(), id, e))?;

    let has_variants = read_flag(doc, FIELD_HAS_VARIANTS);
    // Sub-variant flag is meaningless without variants
    let has_sub_variants = has_variants && read_flag(doc, FIELD_HAS_SUB_VARIANTS);
    Ok((formula_kind, has_variants, has_sub_variants))
}

/// Decode a stored material document.
pub(crate) fn material_from_document(id: &str, doc: &Document) -> CalcResult<Material> {
    let collection = CollectionPath::materials();
    let name = read_name(doc, &collection, id)?;
    let (formula_kind, has_variants, has_sub_variants) = material_shape(id, doc)?;

    let hierarchy = if !has_variants {
        Hierarchy::Leaf {
            coefficient: read_coefficient(doc, formula_kind, &collection, id)?,
        }
    } else if has_sub_variants {
        Hierarchy::SubVariants
    } else {
        Hierarchy::Variants
    };

    Ok(Material {
        id: id.to_string(),
        name,
        formula_kind,
        hierarchy,
    })
}

/// Decode a stored variant document in the context of its material.
pub(crate) fn variant_from_document(material: &Material, id: &str, doc: &Document) -> CalcResult<Variant> {
    let collection = CollectionPath::variants(&material.id);
    let name = read_name(doc, &collection, id)?;
    let coefficient = if material.has_sub_variants() {
        None
    } else {
        Some(read_coefficient(doc, material.formula_kind, &collection, id)?)
    };
    Ok(Variant {
        id: id.to_string(),
        material_id: material.id.clone(),
        name,
        coefficient,
    })
}

/// Decode a stored sub-variant document in the context of its material.
pub(crate) fn sub_variant_from_document(
    material: &Material,
    variant_id: &str,
    id: &str,
    doc: &Document,
) -> CalcResult<SubVariant> {
    let collection = CollectionPath::sub_variants(&material.id, variant_id);
    Ok(SubVariant {
        id: id.to_string(),
        material_id: material.id.clone(),
        variant_id: variant_id.to_string(),
        name: read_name(doc, &collection, id)?,
        coefficient: read_coefficient(doc, material.formula_kind, &collection, id)?,
    })
}
