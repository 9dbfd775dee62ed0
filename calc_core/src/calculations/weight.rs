//! # Weight and Cost Calculation
//!
//! Computes the total weight and cost of `quantity` pieces of a catalog leaf.
//!
//! ## Formulas
//!
//! - **Length-based**: `weight per piece (kg) = kg/m × length (m)`
//! - **Volume-based**: `volume (cm³) = length (mm) × width (mm) × thickness (mm) / 1000`,
//!   then `weight per piece (kg) = volume × density (g/cm³) / 1000`
//!
//! Then `total weight = weight per piece × quantity` and
//! `total cost = total weight × rate per kg`.
//!
//! Results keep full floating-point precision. Round only for display, with
//! [`WeightResult::rounded`].
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::weight::{calculate, WeightInput};
//! use calc_core::catalog::{CatalogRepository, FormulaKind, MaterialSpec, Selection};
//! use calc_core::store::MemoryStore;
//!
//! let mut repo = CatalogRepository::new(MemoryStore::new());
//! let id = repo
//!     .create_material(&MaterialSpec::new("MS Flat", FormulaKind::LengthBased).with_weight_per_meter(2.5))
//!     .unwrap();
//! let leaf = repo.resolve_leaf(&Selection::material(&id)).unwrap();
//!
//! let input = WeightInput::new(100.0).with_length_m(4.0).with_quantity(3);
//! let result = calculate(&leaf, &input).unwrap();
//!
//! assert!((result.total_weight_kg - 30.0).abs() < 1e-9);
//! assert!((result.total_cost - 3000.0).abs() < 1e-9);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{Coefficient, FormulaKind, LeafNode};
use crate::errors::{CalcError, CalcResult};
use crate::units::{CubicCentimeters, Kilograms, Meters, Millimeters};

/// Pieces assumed when no quantity is given
pub const DEFAULT_QUANTITY: i64 = 1;

/// Input parameters for a weight/cost calculation.
///
/// Only the dimensions the leaf's formula needs are read: `length_m` for
/// length-based leaves, all three for volume-based ones.
///
/// ## JSON Example
///
/// ```json
/// { "length_m": 1.0, "width_mm": 10.0, "thickness_mm": 5.0, "quantity": 1, "rate_per_kg": 50.0 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightInput {
    /// Length of one piece in meters
    #[serde(default)]
    pub length_m: Option<f64>,

    /// Width of one piece in millimeters (volume-based only)
    #[serde(default)]
    pub width_mm: Option<f64>,

    /// Thickness of one piece in millimeters (volume-based only)
    #[serde(default)]
    pub thickness_mm: Option<f64>,

    /// Number of pieces, at least 1. Defaults to 1.
    #[serde(default)]
    pub quantity: Option<i64>,

    /// Price per kilogram; zero is allowed
    #[serde(default)]
    pub rate_per_kg: f64,
}

impl WeightInput {
    pub fn new(rate_per_kg: f64) -> Self {
        WeightInput {
            rate_per_kg,
            ..Default::default()
        }
    }

    pub fn with_length_m(mut self, length_m: f64) -> Self {
        self.length_m = Some(length_m);
        self
    }

    pub fn with_section_mm(mut self, width_mm: f64, thickness_mm: f64) -> Self {
        self.width_mm = Some(width_mm);
        self.thickness_mm = Some(thickness_mm);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// Form-style input: every field is free text, possibly blank.
///
/// Blank fields mean "not given". Dimensions the formula does not use are
/// ignored even if they are garbage; a blank rate counts as zero; a blank
/// quantity counts as one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWeightInput {
    #[serde(default)]
    pub length_m: String,
    #[serde(default)]
    pub width_mm: String,
    #[serde(default)]
    pub thickness_mm: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub rate_per_kg: String,
}

impl RawWeightInput {
    /// Parse into a [`WeightInput`] for a leaf of the given formula kind.
    pub fn parse(&self, kind: FormulaKind) -> CalcResult<WeightInput> {
        let volume = kind == FormulaKind::VolumeBased;
        Ok(WeightInput {
            length_m: parse_number("length_m", &self.length_m)?,
            width_mm: if volume { parse_number("width_mm", &self.width_mm)? } else { None },
            thickness_mm: if volume {
                parse_number("thickness_mm", &self.thickness_mm)?
            } else {
                None
            },
            quantity: parse_count("quantity", &self.quantity)?,
            rate_per_kg: parse_number("rate_per_kg", &self.rate_per_kg)?.unwrap_or(0.0),
        })
    }
}

fn parse_number(field: &str, text: &str) -> CalcResult<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| CalcError::invalid_input(field, text, "Not a number"))
}

fn parse_count(field: &str, text: &str) -> CalcResult<Option<i64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| CalcError::invalid_input(field, text, "Not a whole number"))
}

/// Results of a weight/cost calculation, full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightResult {
    /// Leaf the result was computed for
    pub leaf_name: String,
    pub formula_kind: FormulaKind,
    /// Volume of one piece (volume-based only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_per_unit_cm3: Option<f64>,
    pub weight_per_unit_kg: f64,
    pub quantity: i64,
    pub rate_per_kg: f64,
    pub total_weight_kg: f64,
    pub total_cost: f64,
}

impl WeightResult {
    /// Copy with the weights, volume and cost rounded to 2 decimal places
    pub fn rounded(&self) -> Self {
        WeightResult {
            volume_per_unit_cm3: self.volume_per_unit_cm3.map(round2),
            weight_per_unit_kg: round2(self.weight_per_unit_kg),
            total_weight_kg: round2(self.total_weight_kg),
            total_cost: round2(self.total_cost),
            ..self.clone()
        }
    }

    /// Two-line summary with the given currency symbol
    pub fn summary(&self, currency: &str) -> String {
        let shown = self.rounded();
        format!(
            "Total Weight: {:.2} kg\nTotal Cost: {}{:.2}",
            shown.total_weight_kg, currency, shown.total_cost
        )
    }
}

impl fmt::Display for WeightResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.rounded();
        write!(
            f,
            "{} x{}: {:.2} kg, {:.2}",
            shown.leaf_name, shown.quantity, shown.total_weight_kg, shown.total_cost
        )
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Dimension the formula needs: present, finite, not negative.
fn required(field: &str, value: Option<f64>, kind: FormulaKind) -> CalcResult<f64> {
    let value = value.ok_or_else(|| CalcError::invalid_input(field, "(missing)", format!("Required for {kind} materials")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::invalid_input(field, value.to_string(), "Must be a non-negative number"));
    }
    Ok(value)
}

/// Compute total weight and cost for `input` pieces of `leaf`.
///
/// # Errors
///
/// `CalcError::InvalidInput` when quantity is below 1, the rate is negative
/// or not a number, or a dimension the formula needs is missing or negative.
pub fn calculate(leaf: &LeafNode, input: &WeightInput) -> CalcResult<WeightResult> {
    let quantity = input.quantity.unwrap_or(DEFAULT_QUANTITY);
    if quantity < 1 {
        return Err(CalcError::invalid_input("quantity", quantity.to_string(), "Quantity must be at least 1"));
    }
    if !input.rate_per_kg.is_finite() || input.rate_per_kg < 0.0 {
        return Err(CalcError::invalid_input(
            "rate_per_kg",
            input.rate_per_kg.to_string(),
            "Rate must be a non-negative number",
        ));
    }

    let kind = leaf.formula_kind;
    let (weight_per_unit, volume) = match leaf.coefficient {
        Coefficient::LengthBased { weight_per_unit_length } => {
            let length = Meters(required("length_m", input.length_m, kind)?);
            (weight_per_unit_length * length, None)
        }
        Coefficient::VolumeBased { density } => {
            let length: Millimeters = Meters(required("length_m", input.length_m, kind)?).into();
            let width = Millimeters(required("width_mm", input.width_mm, kind)?);
            let thickness = Millimeters(required("thickness_mm", input.thickness_mm, kind)?);
            let volume = CubicCentimeters::from_box(length, width, thickness);
            let weight: Kilograms = (density * volume).into();
            (weight, Some(volume))
        }
    };

    let total_weight = weight_per_unit * quantity as f64;
    let total_cost = total_weight.value() * input.rate_per_kg;

    Ok(WeightResult {
        leaf_name: leaf.display_name(),
        formula_kind: kind,
        volume_per_unit_cm3: volume.map(CubicCentimeters::value),
        weight_per_unit_kg: weight_per_unit.value(),
        quantity,
        rate_per_kg: input.rate_per_kg,
        total_weight_kg: total_weight.value(),
        total_cost,
    })
}

/// Parse form-style input for `leaf`, then [`calculate`].
pub fn calculate_raw(leaf: &LeafNode, raw: &RawWeightInput) -> CalcResult<WeightResult> {
    let input = raw.parse(leaf.formula_kind)?;
    calculate(leaf, &input)
}
