//! # Unit Types
//!
//! Type-safe wrappers for the handful of metric units the calculator touches.
//! These are plain f64 newtypes that serialize as bare numbers.
//!
//! ## Units in Play
//!
//! - Length: meters (m) for length-based stock, millimeters (mm) for section dimensions
//! - Volume: cubic centimeters (cm³)
//! - Mass: grams (g), kilograms (kg)
//! - Linear mass: kilograms per meter (kg/m)
//! - Density: grams per cubic centimeter (g/cm³)
//!
//! ## Example
//!
//! ```rust
//! use calc_core::units::{Meters, Millimeters, Grams, Kilograms};
//!
//! let length = Meters(1.5);
//! let length_mm: Millimeters = length.into();
//! assert_eq!(length_mm.0, 1500.0);
//!
//! let mass: Kilograms = Grams(2500.0).into();
//! assert_eq!(mass.0, 2.5);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Mul;

// ============================================================================
// Length Units
// ============================================================================

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

// ============================================================================
// Volume Units
// ============================================================================

/// Volume in cubic centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicCentimeters(pub f64);

impl CubicCentimeters {
    /// Volume of a rectangular bar given its three edges in millimeters.
    ///
    /// 1 cm³ = 1000 mm³.
    pub fn from_box(length: Millimeters, width: Millimeters, thickness: Millimeters) -> Self {
        CubicCentimeters(length.0 * width.0 * thickness.0 / 1000.0)
    }
}

// ============================================================================
// Mass Units
// ============================================================================

/// Mass in grams
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grams(pub f64);

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

impl From<Grams> for Kilograms {
    fn from(g: Grams) -> Self {
        Kilograms(g.0 / 1000.0)
    }
}

// ============================================================================
// Coefficient Units
// ============================================================================

/// Linear mass in kilograms per meter
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KgPerMeter(pub f64);

impl Mul<Meters> for KgPerMeter {
    type Output = Kilograms;
    fn mul(self, rhs: Meters) -> Kilograms {
        Kilograms(self.0 * rhs.0)
    }
}

/// Density in grams per cubic centimeter
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GramsPerCm3(pub f64);

impl Mul<CubicCentimeters> for GramsPerCm3 {
    type Output = Grams;
    fn mul(self, rhs: CubicCentimeters) -> Grams {
        Grams(self.0 * rhs.0)
    }
}

// ============================================================================
// Scaling
// ============================================================================

macro_rules! impl_scaling {
    ($type:ty) => {
        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_scaling!(Meters);
impl_scaling!(Millimeters);
impl_scaling!(CubicCentimeters);
impl_scaling!(Grams);
impl_scaling!(Kilograms);
impl_scaling!(KgPerMeter);
impl_scaling!(GramsPerCm3);
